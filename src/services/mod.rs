//! Business logic services

pub mod auth;
pub mod borrows;
pub mod email;
pub mod equipment;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EmailConfig},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub equipment: equipment::EquipmentService,
    pub borrows: borrows::BorrowService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        email_config: EmailConfig,
    ) -> Self {
        let notifier: Arc<dyn email::Notifier> =
            Arc::new(email::EmailService::new(email_config));

        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            equipment: equipment::EquipmentService::new(repository.clone()),
            borrows: borrows::BorrowService::new(repository, notifier),
        }
    }
}
