//! Borrow request model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::RequestStatus;
use super::user::UserPublic;

/// Borrow request model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowRequest {
    pub id: i32,
    pub user_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub status: RequestStatus,
    pub return_date: Option<DateTime<Utc>>,
    pub collection_date_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Borrow request with owner profile for list display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowRequestDetails {
    pub id: i32,
    pub borrow_date: DateTime<Utc>,
    pub status: RequestStatus,
    pub return_date: Option<DateTime<Utc>>,
    pub collection_date_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Derived: approved and past its return date at query time
    pub is_overdue: bool,
    pub user: UserPublic,
}

/// One requested line in a submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ItemRequest {
    pub equipment_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub description: Option<String>,
}

/// Submit borrow request payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitRequest {
    #[validate(length(min = 1, message = "At least one item is required"), nested)]
    pub items: Vec<ItemRequest>,
    pub collection_date_time: DateTime<Utc>,
}

/// Per-item approval decision
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ItemDecision {
    pub borrowed_item_id: i32,
    pub allow: bool,
    pub description: Option<String>,
    pub serial_number: Option<String>,
}

/// Approve borrow request payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApproveRequest {
    pub return_date: DateTime<Utc>,
    #[validate(length(min = 1, message = "At least one item decision is required"), nested)]
    pub items: Vec<ItemDecision>,
}

/// Outcome of a reminder sweep
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReminderSweep {
    pub reminders_sent: u32,
    pub cutoff: DateTime<Utc>,
}
