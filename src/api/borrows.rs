//! Borrow workflow endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        audit::AuditEntryDetails,
        borrow::{ApproveRequest, BorrowRequest, BorrowRequestDetails, SubmitRequest},
        item::BorrowedItemDetails,
    },
};

use super::AuthenticatedUser;

/// Submission response with the stored request and its lines
#[derive(Serialize, ToSchema)]
pub struct SubmitResponse {
    /// Status message
    pub message: String,
    /// The stored request
    pub request: BorrowRequest,
    /// Its item lines
    pub items: Vec<BorrowedItemDetails>,
}

/// Response carrying the updated request
#[derive(Serialize, ToSchema)]
pub struct RequestResponse {
    /// Status message
    pub message: String,
    /// The updated request
    pub request: BorrowRequest,
}

/// Reminder sweep response
#[derive(Serialize, ToSchema)]
pub struct ReminderResponse {
    /// Status message
    pub message: String,
    /// Number of reminders delivered
    pub reminders_sent: u32,
    /// Requests due up to this instant were considered
    pub cutoff: DateTime<Utc>,
}

/// Submit a borrow request (student)
#[utoipa::path(
    post,
    path = "/borrow/request",
    tag = "borrow",
    security(("bearer_auth" = [])),
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Request submitted", body = SubmitResponse),
        (status = 400, description = "Invalid payload or unknown equipment"),
        (status = 403, description = "Student role required")
    )
)]
pub async fn submit_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<SubmitRequest>,
) -> AppResult<(StatusCode, Json<SubmitResponse>)> {
    claims.require_student()?;

    let (request, items) = state
        .services
        .borrows
        .submit_request(claims.user_id, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Borrow request submitted successfully".to_string(),
            request,
            items,
        }),
    ))
}

/// Approve a pending request with per-item decisions (admin)
#[utoipa::path(
    put,
    path = "/borrow/approve/{id}",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow request ID")),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Request approved", body = RequestResponse),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Request or decision item not found"),
        (status = 409, description = "Request already processed")
    )
)]
pub async fn approve_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<ApproveRequest>,
) -> AppResult<Json<RequestResponse>> {
    claims.require_admin()?;

    let request = state.services.borrows.approve_request(id, payload).await?;

    Ok(Json(RequestResponse {
        message: "Request approved successfully".to_string(),
        request,
    }))
}

/// Mark an approved request's equipment as returned (admin)
#[utoipa::path(
    put,
    path = "/borrow/return/{id}",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Equipment returned", body = RequestResponse),
        (status = 400, description = "Request is not in a returnable state"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn return_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RequestResponse>> {
    claims.require_admin()?;

    let request = state.services.borrows.return_equipment(id).await?;

    Ok(Json(RequestResponse {
        message: "Equipment returned successfully".to_string(),
        request,
    }))
}

/// Send due-date reminders for requests due within two days (admin)
#[utoipa::path(
    post,
    path = "/borrow/send-reminder",
    tag = "borrow",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep completed", body = ReminderResponse),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn send_reminders(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ReminderResponse>> {
    claims.require_admin()?;

    let sweep = state.services.borrows.send_due_reminders().await?;

    Ok(Json(ReminderResponse {
        message: format!("{} reminder(s) sent", sweep.reminders_sent),
        reminders_sent: sweep.reminders_sent,
        cutoff: sweep.cutoff,
    }))
}

/// List requests visible to the caller
#[utoipa::path(
    get,
    path = "/borrow/all-requests",
    tag = "borrow",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Requests with owner profiles", body = Vec<BorrowRequestDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn all_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRequestDetails>>> {
    let requests = state.services.borrows.list_requests(&claims).await?;
    Ok(Json(requests))
}

/// List pending requests visible to the caller
#[utoipa::path(
    get,
    path = "/borrow/pending-requests",
    tag = "borrow",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending requests", body = Vec<BorrowRequestDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn pending_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowRequestDetails>>> {
    let requests = state.services.borrows.list_pending(&claims).await?;
    Ok(Json(requests))
}

/// Item lines of one request (owner or admin)
#[utoipa::path(
    get,
    path = "/borrow/{id}/items",
    tag = "borrow",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Item lines", body = Vec<BorrowedItemDetails>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn request_items(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BorrowedItemDetails>>> {
    let items = state.services.borrows.items_for_request(&claims, id).await?;
    Ok(Json(items))
}

/// Full audit trail, newest first (admin)
#[utoipa::path(
    get,
    path = "/borrow/logs",
    tag = "borrow",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Audit entries", body = Vec<AuditEntryDetails>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn audit_logs(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<AuditEntryDetails>>> {
    claims.require_admin()?;

    let entries = state.services.borrows.audit_log().await?;
    Ok(Json(entries))
}
