//! FabTrack Equipment Lending System
//!
//! A Rust implementation of the FabTrack fabrication lab server, providing
//! a REST JSON API for equipment lending: borrow requests, approvals,
//! returns, reminders, and an append-only audit trail.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
