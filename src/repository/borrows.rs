//! Borrow requests repository for database operations.
//!
//! Workflow mutations run inside a single transaction together with their
//! audit entry. Approvals take a row lock on the request so concurrent
//! mutations of the same request are serialized.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        audit::NewAuditEntry,
        borrow::{ApproveRequest, BorrowRequest, BorrowRequestDetails, SubmitRequest},
        enums::{AuditAction, RequestStatus},
        item::BorrowedItemDetails,
        user::UserPublic,
    },
};

use super::audit::insert_entry;

const REQUEST_COLUMNS: &str =
    "id, user_id, borrow_date, status, return_date, collection_date_time, created_at";

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow request by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<BorrowRequest> {
        let query = format!(
            "SELECT {} FROM borrow_requests WHERE id = $1",
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
    }

    /// Public profile of a request's owner, None when the request is missing
    pub async fn owner_public(&self, request_id: i32) -> AppResult<Option<UserPublic>> {
        let owner = sqlx::query_as::<_, UserPublic>(
            r#"
            SELECT u.id, u.name, u.email, u.role, u.major, u.year_group
            FROM borrow_requests r
            JOIN users u ON r.user_id = u.id
            WHERE r.id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    /// Create a request with its item lines and the Borrow audit entry
    /// in one transaction. Fails if any equipment ID does not resolve.
    pub async fn create_with_items(
        &self,
        user_id: i32,
        submission: &SubmitRequest,
        audit_details: &str,
    ) -> AppResult<(BorrowRequest, Vec<BorrowedItemDetails>)> {
        let mut tx = self.pool.begin().await?;

        let insert = format!(
            r#"
            INSERT INTO borrow_requests (user_id, status, collection_date_time)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, BorrowRequest>(&insert)
            .bind(user_id)
            .bind(RequestStatus::Pending)
            .bind(submission.collection_date_time)
            .fetch_one(&mut *tx)
            .await?;

        let mut items = Vec::with_capacity(submission.items.len());
        for item in &submission.items {
            let equipment_name: Option<String> =
                sqlx::query_scalar("SELECT name FROM equipment WHERE id = $1")
                    .bind(item.equipment_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let equipment_name = equipment_name.ok_or_else(|| {
                AppError::Validation(format!("Equipment not found: ID={}", item.equipment_id))
            })?;

            let item_id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO borrowed_items (request_id, equipment_id, description, quantity)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(request.id)
            .bind(item.equipment_id)
            .bind(&item.description)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;

            items.push(BorrowedItemDetails {
                id: item_id,
                request_id: request.id,
                equipment_id: item.equipment_id,
                equipment_name,
                description: item.description.clone(),
                serial_number: None,
                quantity: item.quantity,
            });
        }

        insert_entry(
            &mut *tx,
            &NewAuditEntry::new(
                user_id,
                Some(request.id),
                AuditAction::Borrow,
                audit_details,
            ),
        )
        .await?;

        tx.commit().await?;

        Ok((request, items))
    }

    /// Apply an admin approval: per-item keep/deny decisions, final status,
    /// and the Approve audit entry, all under a row lock on the request.
    ///
    /// A request that is no longer Pending fails with a conflict, which is
    /// what the loser of a concurrent approval race observes.
    pub async fn apply_approval(
        &self,
        request_id: i32,
        payload: &ApproveRequest,
        audit_details: &str,
    ) -> AppResult<(BorrowRequest, Vec<BorrowedItemDetails>)> {
        let mut tx = self.pool.begin().await?;

        let lock = format!(
            "SELECT {} FROM borrow_requests WHERE id = $1 FOR UPDATE",
            REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, BorrowRequest>(&lock)
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", request_id)))?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Request {} has already been processed",
                request_id
            )));
        }

        for decision in &payload.items {
            let item_id: Option<i32> = sqlx::query_scalar(
                "SELECT id FROM borrowed_items WHERE id = $1 AND request_id = $2",
            )
            .bind(decision.borrowed_item_id)
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await?;

            if item_id.is_none() {
                return Err(AppError::NotFound(format!(
                    "Borrowed item {} not found for request {}",
                    decision.borrowed_item_id, request_id
                )));
            }

            if !decision.allow {
                sqlx::query("DELETE FROM borrowed_items WHERE id = $1")
                    .bind(decision.borrowed_item_id)
                    .execute(&mut *tx)
                    .await?;
            } else if decision.description.is_some() || decision.serial_number.is_some() {
                sqlx::query(
                    r#"
                    UPDATE borrowed_items
                    SET description = COALESCE($1, description),
                        serial_number = COALESCE($2, serial_number)
                    WHERE id = $3
                    "#,
                )
                .bind(&decision.description)
                .bind(&decision.serial_number)
                .bind(decision.borrowed_item_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrowed_items WHERE request_id = $1")
                .bind(request_id)
                .fetch_one(&mut *tx)
                .await?;

        // All items denied: the request is voided straight to Returned and
        // never carries a return date.
        let request = if remaining == 0 {
            let update = format!(
                "UPDATE borrow_requests SET status = $1 WHERE id = $2 RETURNING {}",
                REQUEST_COLUMNS
            );
            sqlx::query_as::<_, BorrowRequest>(&update)
                .bind(RequestStatus::Returned)
                .bind(request_id)
                .fetch_one(&mut *tx)
                .await?
        } else {
            let update = format!(
                "UPDATE borrow_requests SET status = $1, return_date = $2 WHERE id = $3 RETURNING {}",
                REQUEST_COLUMNS
            );
            sqlx::query_as::<_, BorrowRequest>(&update)
                .bind(RequestStatus::Approved)
                .bind(payload.return_date)
                .bind(request_id)
                .fetch_one(&mut *tx)
                .await?
        };

        let items = sqlx::query_as::<_, BorrowedItemDetails>(
            r#"
            SELECT bi.id, bi.request_id, bi.equipment_id, e.name as equipment_name,
                   bi.description, bi.serial_number, bi.quantity
            FROM borrowed_items bi
            JOIN equipment e ON bi.equipment_id = e.id
            WHERE bi.request_id = $1
            ORDER BY bi.id
            "#,
        )
        .bind(request_id)
        .fetch_all(&mut *tx)
        .await?;

        insert_entry(
            &mut *tx,
            &NewAuditEntry::new(
                request.user_id,
                Some(request_id),
                AuditAction::Approve,
                audit_details,
            ),
        )
        .await?;

        tx.commit().await?;

        Ok((request, items))
    }

    /// Record a physical return: one guarded transition Approved -> Returned
    /// plus the Return audit entry. Zero rows updated means the request is
    /// missing, still pending, or already returned; callers get the same
    /// invalid-state error for all three.
    pub async fn mark_returned(
        &self,
        request_id: i32,
        audit: &NewAuditEntry,
    ) -> AppResult<BorrowRequest> {
        let mut tx = self.pool.begin().await?;

        let update = format!(
            "UPDATE borrow_requests SET status = $1 WHERE id = $2 AND status = $3 RETURNING {}",
            REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, BorrowRequest>(&update)
            .bind(RequestStatus::Returned)
            .bind(request_id)
            .bind(RequestStatus::Approved)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::InvalidState("Invalid return request".to_string()))?;

        insert_entry(&mut *tx, audit).await?;

        tx.commit().await?;

        Ok(request)
    }

    /// List requests with owner profiles, newest first, optionally scoped
    /// to one owner and/or one status
    pub async fn list(
        &self,
        owner: Option<i32>,
        status: Option<RequestStatus>,
    ) -> AppResult<Vec<BorrowRequestDetails>> {
        let mut conditions = Vec::new();
        if owner.is_some() {
            conditions.push(format!("r.user_id = ${}", conditions.len() + 1));
        }
        if status.is_some() {
            conditions.push(format!("r.status = ${}", conditions.len() + 1));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT r.id, r.user_id, r.borrow_date, r.status, r.return_date,
                   r.collection_date_time, r.created_at,
                   u.name, u.email, u.role, u.major, u.year_group
            FROM borrow_requests r
            JOIN users u ON r.user_id = u.id
            {}
            ORDER BY r.id DESC
            "#,
            where_clause
        );

        let mut query = sqlx::query(&sql);
        if let Some(user_id) = owner {
            query = query.bind(user_id);
        }
        if let Some(status) = status {
            query = query.bind(status);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let now = Utc::now();

        let mut result = Vec::new();
        for row in rows {
            let status: RequestStatus = row.get("status");
            let return_date: Option<DateTime<Utc>> = row.get("return_date");

            result.push(BorrowRequestDetails {
                id: row.get("id"),
                borrow_date: row.get("borrow_date"),
                status,
                return_date,
                collection_date_time: row.get("collection_date_time"),
                created_at: row.get("created_at"),
                is_overdue: status == RequestStatus::Approved
                    && return_date.map(|d| d < now).unwrap_or(false),
                user: UserPublic {
                    id: row.get("user_id"),
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

    /// Item lines of a request with their equipment names
    pub async fn items_for_request(&self, request_id: i32) -> AppResult<Vec<BorrowedItemDetails>> {
        let items = sqlx::query_as::<_, BorrowedItemDetails>(
            r#"
            SELECT bi.id, bi.request_id, bi.equipment_id, e.name as equipment_name,
                   bi.description, bi.serial_number, bi.quantity
            FROM borrowed_items bi
            JOIN equipment e ON bi.equipment_id = e.id
            WHERE bi.request_id = $1
            ORDER BY bi.id
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Approved requests due on or before the cutoff
    pub async fn due_for_reminder(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<BorrowRequest>> {
        let query = format!(
            r#"
            SELECT {}
            FROM borrow_requests
            WHERE status = $1 AND return_date IS NOT NULL AND return_date <= $2
            ORDER BY return_date
            "#,
            REQUEST_COLUMNS
        );
        let requests = sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(RequestStatus::Approved)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    /// Persist one sent reminder and its Notify audit entry in one transaction
    pub async fn record_reminder(
        &self,
        request_id: i32,
        audit: &NewAuditEntry,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO reminders (request_id, reminder_date, sent) VALUES ($1, $2, TRUE)",
        )
        .bind(request_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        insert_entry(&mut *tx, audit).await?;

        tx.commit().await?;

        Ok(())
    }
}
