//! Audit trail repository. Append-only: no update or delete surface.

use sqlx::{PgExecutor, Pool, Postgres, Row};

use crate::{
    error::AppResult,
    models::{
        audit::{AuditEntryDetails, NewAuditEntry},
        user::UserPublic,
    },
};

/// Insert one audit row through any executor, so workflow code can append
/// inside the transaction that carries the primary mutation.
pub(crate) async fn insert_entry<'e, E>(executor: E, entry: &NewAuditEntry) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO audit_logs (user_id, request_id, action, details)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.request_id)
    .bind(entry.action)
    .bind(&entry.details)
    .execute(executor)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct AuditRepository {
    pool: Pool<Postgres>,
}

impl AuditRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get all entries, newest first, with each actor's public profile
    pub async fn list(&self) -> AppResult<Vec<AuditEntryDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id, a.request_id, a.action, a.details, a.timestamp,
                   u.id as actor_id, u.name, u.email, u.role, u.major, u.year_group
            FROM audit_logs a
            JOIN users u ON a.user_id = u.id
            ORDER BY a.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::new();
        for row in rows {
            result.push(AuditEntryDetails {
                id: row.get("id"),
                request_id: row.get("request_id"),
                action: row.get("action"),
                details: row.get("details"),
                timestamp: row.get("timestamp"),
                user: UserPublic {
                    id: row.get("actor_id"),
                    name: row.get("name"),
                    email: row.get("email"),
                    role: row.get("role"),
                    major: row.get("major"),
                    year_group: row.get("year_group"),
                },
            });
        }

        Ok(result)
    }
}
