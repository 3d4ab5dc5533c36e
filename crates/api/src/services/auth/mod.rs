//! Authentication service.
//!
//! Provides password authentication with Argon2id hashes and stateless HS256
//! bearer tokens. Logout revokes a token by blacklisting its `jti`.

mod error;
mod jwt;

use std::sync::LazyLock;

pub use error::AuthError;
pub use jwt::{Claims, JwtKeys};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, instrument};

use bazaar_core::validation::required_text;
use bazaar_core::{Email, UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::{UserChanges, UserRepository};
use crate::models::user::{CurrentUser, ProfileUpdate, User};
use crate::services::blacklist::TokenBlacklist;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length (Argon2 input is bounded to keep hashing cheap).
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum display name length.
const MAX_NAME_LENGTH: usize = 100;

/// Hash checked when login has no account to check against, so every failed
/// login pays for one Argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("bazaar-login-timing-placeholder").ok());

/// Authentication service.
///
/// Handles registration, login, logout, token verification, and profile
/// updates.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
    keys: &'a JwtKeys,
    blacklist: &'a TokenBlacklist,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, keys: &'a JwtKeys, blacklist: &'a TokenBlacklist) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
            keys,
            blacklist,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new customer and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, name, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AuthError> {
        let name = validate_name(name)?;
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&name, &email, &password_hash, UserRole::Customer)
            .await
            .map_err(map_conflict)?;

        info!(user_id = %user.id, "User registered");
        let (token, _) = self.keys.issue(user.id, Utc::now())?;
        Ok((user, token))
    }

    /// Login with email and password and issue a token.
    ///
    /// Unknown emails and wrong passwords produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Err(reject_without_account(password));
        };

        let Some((user, password_hash)) = self.users.get_password_hash(&email).await? else {
            return Err(reject_without_account(password));
        };

        verify_password(password, &password_hash)?;

        let (token, _) = self.keys.issue(user.id, Utc::now())?;
        Ok((user, token))
    }

    /// Revoke the caller's current token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the blacklist insert fails.
    #[instrument(skip(self, current), fields(user_id = %current.id()))]
    pub async fn logout(&self, current: &CurrentUser) -> Result<(), AuthError> {
        self.blacklist
            .revoke(self.pool, current.jti, current.id(), current.expires_at)
            .await?;
        info!("Token revoked");
        Ok(())
    }

    /// Resolve a bearer token to the current user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a bad or expired token,
    /// `AuthError::TokenRevoked` after logout, and `AuthError::UserNotFound`
    /// if the account was deleted.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let claims = self.keys.verify(token)?;
        if self.blacklist.is_revoked(self.pool, claims.jti).await? {
            return Err(AuthError::TokenRevoked);
        }
        let user = self
            .users
            .get_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(CurrentUser {
            user,
            jti: claims.jti,
            expires_at: claims.expires_at(),
        })
    }

    /// Update the caller's own name, email, or password.
    ///
    /// # Errors
    ///
    /// Returns validation errors as `AuthError` variants, and
    /// `AuthError::UserAlreadyExists` if the new email is taken.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, AuthError> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let email = update.email.as_deref().map(Email::parse).transpose()?;
        let password_hash = match update.password.as_deref() {
            Some(password) if !password.is_empty() => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            _ => None,
        };

        let changes = UserChanges {
            name: name.as_deref(),
            email: email.as_ref(),
            password_hash: password_hash.as_deref(),
            role: None,
        };
        self.users
            .update(user_id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => map_conflict(other),
            })
    }
}

fn map_conflict(e: RepositoryError) -> AuthError {
    match e {
        RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
        other => AuthError::Repository(other),
    }
}

/// Validate a display name.
fn validate_name(name: &str) -> Result<String, AuthError> {
    Ok(required_text("name", name, MAX_NAME_LENGTH)?)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Burn one verification against [`DUMMY_HASH`] so a login for a missing
/// account takes as long as a wrong password.
fn reject_without_account(password: &str) -> AuthError {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        // Only the time spent matters.
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("samepass").unwrap(), hash_password("samepass").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_login_placeholder_hash_is_a_real_argon2_hash() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        let parsed = PasswordHash::new(hash).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(matches!(
            reject_without_account("someone's password"),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_password_rules() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(validate_name("  Ada ").unwrap(), "Ada");
        assert!(validate_name("   ").is_err());
    }
}
