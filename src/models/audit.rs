//! Audit trail model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::AuditAction;
use super::user::UserPublic;

/// Audit log entry from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AuditEntry {
    pub id: i32,
    pub user_id: i32,
    pub request_id: Option<i32>,
    pub action: AuditAction,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

/// Audit log entry with actor profile for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditEntryDetails {
    pub id: i32,
    pub request_id: Option<i32>,
    pub action: AuditAction,
    pub details: String,
    pub timestamp: DateTime<Utc>,
    pub user: UserPublic,
}

/// New audit entry to append
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub user_id: i32,
    pub request_id: Option<i32>,
    pub action: AuditAction,
    pub details: String,
}

impl NewAuditEntry {
    pub fn new(user_id: i32, request_id: Option<i32>, action: AuditAction, details: impl Into<String>) -> Self {
        Self {
            user_id,
            request_id,
            action,
            details: details.into(),
        }
    }
}
