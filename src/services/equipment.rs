//! Equipment catalog service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        audit::NewAuditEntry,
        enums::AuditAction,
        equipment::{CreateEquipment, Equipment, UpdateEquipment},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
}

impl EquipmentService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Equipment>> {
        self.repository.equipment.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<Equipment> {
        self.repository.equipment.get_by_id(id).await
    }

    /// Add a catalog entry, recording which admin added it
    pub async fn create(&self, admin_id: i32, payload: CreateEquipment) -> AppResult<Equipment> {
        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let audit = NewAuditEntry::new(
            admin_id,
            None,
            AuditAction::Create,
            format!("Equipment added by Admin: {}", payload.name),
        );

        self.repository.equipment.create(&payload, &audit).await
    }

    /// Rename a catalog entry
    pub async fn update(
        &self,
        admin_id: i32,
        id: i32,
        payload: UpdateEquipment,
    ) -> AppResult<Equipment> {
        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let audit = NewAuditEntry::new(
            admin_id,
            None,
            AuditAction::Update,
            format!("Equipment {} updated by Admin", id),
        );

        self.repository.equipment.update(id, &payload, &audit).await
    }

    /// Remove a catalog entry. Refused while borrow lines still reference it.
    pub async fn delete(&self, admin_id: i32, id: i32) -> AppResult<()> {
        let audit = NewAuditEntry::new(
            admin_id,
            None,
            AuditAction::Delete,
            format!("Equipment {} deleted by Admin", id),
        );

        self.repository.equipment.delete(id, &audit).await
    }
}
