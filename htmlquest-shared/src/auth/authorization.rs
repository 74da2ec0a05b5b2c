/// Role and ownership checks
///
/// Handlers call these right after extracting [`AuthContext`] and before any
/// write. All checks are pure functions over the context and the row being
/// touched, so they never hit the database themselves.
///
/// # Example
///
/// ```
/// use htmlquest_shared::auth::authorization::{require_any_role, require_role};
/// use htmlquest_shared::auth::middleware::AuthContext;
/// use htmlquest_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let supervisor = AuthContext::new(Uuid::new_v4(), UserRole::Supervisor);
/// assert!(require_role(&supervisor, UserRole::Admin).is_err());
/// assert!(require_any_role(&supervisor, &[UserRole::Supervisor, UserRole::Admin]).is_ok());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("Insufficient role: requires one of {required:?}, has {actual:?}")]
    InsufficientRole {
        required: Vec<UserRole>,
        actual: UserRole,
    },

    #[error("Not authorized to modify this resource")]
    NotOwner,
}

pub fn require_role(auth: &AuthContext, role: UserRole) -> Result<(), AuthzError> {
    require_any_role(auth, &[role])
}

pub fn require_any_role(auth: &AuthContext, roles: &[UserRole]) -> Result<(), AuthzError> {
    if roles.contains(&auth.role) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole {
            required: roles.to_vec(),
            actual: auth.role,
        })
    }
}

/// Only the owner may edit their resource
pub fn require_owner(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id == owner_id {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}

/// Owner or any admin (moderation deletes)
pub fn require_owner_or_admin(auth: &AuthContext, owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.is_admin() {
        return Ok(());
    }
    require_owner(auth, owner_id)
}
