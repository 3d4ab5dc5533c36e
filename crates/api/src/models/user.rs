//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::{Email, UserId, UserRole};

/// A store account (customer or admin).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this account may use the back office.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// The authenticated caller of a request.
///
/// Built by the auth extractors from a verified bearer token; `user` is
/// loaded fresh from the database on every request so role changes apply
/// immediately.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    /// Token id, used to revoke this token on logout.
    pub jti: Uuid,
    /// When the presented token expires.
    pub expires_at: DateTime<Utc>,
}

impl CurrentUser {
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.user.id
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Self-service profile update. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Admin edit of another account.
#[derive(Debug, Default, Deserialize)]
pub struct AdminUserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

/// User plus a freshly issued token, returned by register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: User,
    pub is_admin: bool,
    pub token: String,
}

impl AuthResponse {
    #[must_use]
    pub fn new(user: User, token: String) -> Self {
        Self {
            is_admin: user.is_admin(),
            user,
            token,
        }
    }
}
