//! Borrowed item (request line) model

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Borrowed item model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowedItem {
    pub id: i32,
    pub request_id: i32,
    pub equipment_id: i32,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub quantity: i32,
}

/// Borrowed item with its equipment name for display
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowedItemDetails {
    pub id: i32,
    pub request_id: i32,
    pub equipment_id: i32,
    pub equipment_name: String,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub quantity: i32,
}
