//! Equipment catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::equipment::{CreateEquipment, Equipment, UpdateEquipment},
};

use super::{auth::MessageResponse, AuthenticatedUser};

/// Equipment mutation response
#[derive(Serialize, ToSchema)]
pub struct EquipmentResponse {
    /// Status message
    pub message: String,
    /// The affected catalog entry
    pub equipment: Equipment,
}

/// List all equipment
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Equipment list", body = Vec<Equipment>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Equipment>>> {
    let equipment = state.services.equipment.list().await?;
    Ok(Json(equipment))
}

/// Get equipment by ID
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn get_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Equipment>> {
    let equipment = state.services.equipment.get(id).await?;
    Ok(Json(equipment))
}

/// Create equipment (admin)
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment created", body = EquipmentResponse),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<EquipmentResponse>)> {
    claims.require_admin()?;

    let equipment = state
        .services
        .equipment
        .create(claims.user_id, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(EquipmentResponse {
            message: "Equipment added successfully".to_string(),
            equipment,
        }),
    ))
}

/// Update equipment (admin)
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    request_body = UpdateEquipment,
    responses(
        (status = 200, description = "Equipment updated", body = EquipmentResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn update_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateEquipment>,
) -> AppResult<Json<EquipmentResponse>> {
    claims.require_admin()?;

    let equipment = state
        .services
        .equipment
        .update(claims.user_id, id, payload)
        .await?;

    Ok(Json(EquipmentResponse {
        message: "Equipment updated successfully".to_string(),
        equipment,
    }))
}

/// Delete equipment (admin)
#[utoipa::path(
    delete,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment deleted", body = MessageResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Equipment not found"),
        (status = 409, description = "Equipment is referenced by borrow requests")
    )
)]
pub async fn delete_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MessageResponse>> {
    claims.require_admin()?;

    state.services.equipment.delete(claims.user_id, id).await?;

    Ok(Json(MessageResponse {
        message: "Equipment deleted successfully".to_string(),
    }))
}
