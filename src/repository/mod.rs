//! Repository layer for database operations

pub mod audit;
pub mod borrows;
pub mod equipment;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub equipment: equipment::EquipmentRepository,
    pub borrows: borrows::BorrowsRepository,
    pub audit: audit::AuditRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            equipment: equipment::EquipmentRepository::new(pool.clone()),
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            audit: audit::AuditRepository::new(pool.clone()),
            pool,
        }
    }
}
