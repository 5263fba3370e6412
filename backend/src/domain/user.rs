//! User identity resolved from the external Auth service.
//!
//! Users are never stored locally. This type mirrors the payload the Auth
//! service returns for a user lookup or token validation.

use serde::{Deserialize, Serialize};

/// User record owned by the Auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Identifier assigned by the Auth service.
    pub id: i32,
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Whether the Auth service flags the user as an administrator.
    pub is_admin: bool,
}
