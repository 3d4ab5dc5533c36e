//! HS256 access tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_core::UserId;

use super::AuthError;
use crate::config::JwtConfig;

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was issued to, as a string.
    pub sub: String,
    /// Unique token id, the blacklist key.
    pub jti: Uuid,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// The user this token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a user id.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Signing and verification keys derived from the configured secret.
///
/// Implements `Debug` manually to keep key material out of logs.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtKeys {
    /// Build keys from configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: config.ttl,
        }
    }

    /// Issue a token for `user_id` valid from `now` for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssue` if signing fails.
    pub fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<(String, Claims), AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to sign token");
                AuthError::TokenIssue
            })?;
        Ok((token, claims))
    }

    /// Verify signature and expiry and return the claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, tampered, or
    /// expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn keys(secret: &str, ttl: Duration) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: SecretString::from(secret),
            ttl,
        })
    }

    const SECRET: &str = "k3Y!9fQz#Lr2@vX8^mN5&tB1*wC7$pH4";

    #[test]
    fn test_issue_then_verify() {
        let keys = keys(SECRET, Duration::hours(1));
        let (token, claims) = keys.issue(UserId::new(42), Utc::now()).unwrap();

        let verified = keys.verify(&token).unwrap();
        assert_eq!(verified, claims);
        assert_eq!(verified.user_id().unwrap(), UserId::new(42));
        assert_eq!(verified.exp - verified.iat, 3600);
    }

    #[test]
    fn test_each_token_gets_a_fresh_jti() {
        let keys = keys(SECRET, Duration::hours(1));
        let now = Utc::now();
        let (_, a) = keys.issue(UserId::new(1), now).unwrap();
        let (_, b) = keys.issue(UserId::new(1), now).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys(SECRET, Duration::hours(1));
        let (token, _) = keys
            .issue(UserId::new(1), Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = keys(SECRET, Duration::hours(1));
        let other = keys("Zz9!different#secret@value^4&8*Qq", Duration::hours(1));
        let (token, _) = issuer.issue(UserId::new(1), Utc::now()).unwrap();
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        assert!(matches!(issuer.verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let output = format!("{:?}", keys(SECRET, Duration::hours(1)));
        assert!(output.contains("[REDACTED]"));
    }
}
