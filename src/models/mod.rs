//! Data models for FabTrack

pub mod audit;
pub mod borrow;
pub mod enums;
pub mod equipment;
pub mod item;
pub mod user;

// Re-export commonly used types
pub use audit::{AuditEntry, AuditEntryDetails, NewAuditEntry};
pub use borrow::{BorrowRequest, BorrowRequestDetails};
pub use enums::{AuditAction, RequestStatus};
pub use equipment::Equipment;
pub use item::{BorrowedItem, BorrowedItemDetails};
pub use user::{Role, User, UserClaims, UserPublic};
