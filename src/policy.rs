//! Authorization policy for borrow request reads.
//!
//! Pure decisions over (caller claims, resource owner) so they can be
//! checked without a database. Role gates on mutating endpoints stay on
//! `UserClaims::require_admin` / `require_student`.

use crate::models::user::{Role, UserClaims};

/// Which requests a caller may list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// Every request (admins)
    All,
    /// Only requests owned by this user (students)
    OwnedBy(i32),
}

/// Visibility scope for request list reads
pub fn request_scope(claims: &UserClaims) -> RequestScope {
    match claims.role {
        Role::Admin => RequestScope::All,
        Role::Student => RequestScope::OwnedBy(claims.user_id),
    }
}

/// Whether the caller may read the item lines of a request owned by `owner_id`
pub fn can_view_request_items(claims: &UserClaims, owner_id: i32) -> bool {
    claims.is_admin() || claims.user_id == owner_id
}
