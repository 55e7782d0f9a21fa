//! Equipment model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    pub name: String,
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

/// Update equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEquipment {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}
