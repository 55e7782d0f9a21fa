//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, borrows, equipment, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FabTrack API",
        version = "1.0.0",
        description = "Fabrication lab equipment lending REST API",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
        contact(name = "FabTrack Team", email = "lab@fabtrack.org")
    ),
    servers(
        (url = "/api", description = "API root")
    ),
    paths(
        // Health
        health::health_check,
        // Auth
        auth::signup,
        auth::login,
        auth::logout,
        auth::edit_profile,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Borrow workflow
        borrows::submit_request,
        borrows::approve_request,
        borrows::return_equipment,
        borrows::send_reminders,
        borrows::all_requests,
        borrows::pending_requests,
        borrows::request_items,
        borrows::audit_logs,
    ),
    components(
        schemas(
            // Auth
            auth::MessageResponse,
            auth::SignupResponse,
            auth::LoginResponse,
            auth::ProfileResponse,
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UserPublic,
            crate::models::user::SignupRequest,
            crate::models::user::LoginRequest,
            crate::models::user::UpdateProfile,
            // Equipment
            equipment::EquipmentResponse,
            crate::models::equipment::Equipment,
            crate::models::equipment::CreateEquipment,
            crate::models::equipment::UpdateEquipment,
            // Borrow workflow
            borrows::SubmitResponse,
            borrows::RequestResponse,
            borrows::ReminderResponse,
            crate::models::enums::RequestStatus,
            crate::models::enums::AuditAction,
            crate::models::borrow::BorrowRequest,
            crate::models::borrow::BorrowRequestDetails,
            crate::models::borrow::SubmitRequest,
            crate::models::borrow::ItemRequest,
            crate::models::borrow::ApproveRequest,
            crate::models::borrow::ItemDecision,
            crate::models::borrow::ReminderSweep,
            crate::models::item::BorrowedItem,
            crate::models::item::BorrowedItemDetails,
            crate::models::audit::AuditEntry,
            crate::models::audit::AuditEntryDetails,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and accounts"),
        (name = "equipment", description = "Equipment catalog management"),
        (name = "borrow", description = "Borrow request workflow")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
