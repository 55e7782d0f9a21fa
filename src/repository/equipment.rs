//! Equipment repository for database operations.
//!
//! Mutations carry their audit entry in the same transaction.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        audit::NewAuditEntry,
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
    },
};

use super::audit::insert_entry;

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all equipment
    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>("SELECT id, name FROM equipment ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get equipment by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT id, name FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Create equipment with its Create audit entry
    pub async fn create(&self, data: &CreateEquipment, audit: &NewAuditEntry) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, Equipment>(
            "INSERT INTO equipment (name) VALUES ($1) RETURNING id, name",
        )
        .bind(&data.name)
        .fetch_one(&mut *tx)
        .await?;

        insert_entry(&mut *tx, audit).await?;

        tx.commit().await?;

        Ok(row)
    }

    /// Update equipment with its Update audit entry
    pub async fn update(
        &self,
        id: i32,
        data: &UpdateEquipment,
        audit: &NewAuditEntry,
    ) -> AppResult<Equipment> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, Equipment>(
            "UPDATE equipment SET name = $1 WHERE id = $2 RETURNING id, name",
        )
        .bind(&data.name)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))?;

        insert_entry(&mut *tx, audit).await?;

        tx.commit().await?;

        Ok(row)
    }

    /// Delete equipment with its Delete audit entry. Refused while any
    /// borrow line still references the row.
    pub async fn delete(&self, id: i32, audit: &NewAuditEntry) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrowed_items WHERE equipment_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if in_use {
            return Err(AppError::Conflict(format!(
                "Equipment {} is referenced by existing borrow requests",
                id
            )));
        }

        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }

        insert_entry(&mut *tx, audit).await?;

        tx.commit().await?;

        Ok(())
    }
}
