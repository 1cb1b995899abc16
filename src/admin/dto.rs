use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::claims::Role;
use crate::auth::repo::User;

/// Request body for admin-created accounts. Role arrives as a plain string
/// so an unknown value yields a validation error, not a deserialize failure.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Partial update: role change and/or (de)activation.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Admin-facing projection of a user record.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
