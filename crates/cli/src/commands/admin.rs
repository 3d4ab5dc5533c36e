//! Admin role management commands.
//!
//! # Usage
//!
//! ```bash
//! # Grant back-office access to an existing account
//! bazaar admin promote -e jane@example.com
//!
//! # Revoke it again
//! bazaar admin demote -e jane@example.com
//! ```
//!
//! The account must already exist; register it through the API first.

use bazaar_api::db::{RepositoryError, UserRepository};
use bazaar_core::{Email, UserRole};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account has this email.
    #[error("No user with email: {0}")]
    UserNotFound(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Give the user with `email` the admin role.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    set_role(email, UserRole::Admin).await
}

/// Return the user with `email` to the customer role.
pub async fn demote(email: &str) -> Result<(), AdminError> {
    set_role(email, UserRole::Customer).await
}

async fn set_role(email: &str, role: UserRole) -> Result<(), AdminError> {
    let parsed = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_role_by_email(&parsed, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Role updated! ID: {}, Email: {}, Role: {:?}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}
