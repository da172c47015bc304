//! JWT token generation and validation.
//!
//! Provides secure JWT handling with access and refresh tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::{Claims, TokenKind};

/// JWT configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expires_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_expires_secs: i64,
}

/// Longest accepted token lifetime: ten years.
const MAX_EXPIRY_SECS: i64 = 315_360_000;

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_secs: 900,
            refresh_token_expires_secs: 604_800,
        }
    }
}

impl From<&crate::config::JwtConfig> for JwtConfig {
    /// Takes the lifetimes from the configuration file, clamped to one second
    /// up to ten years.
    fn from(settings: &crate::config::JwtConfig) -> Self {
        let clamp = |secs: u64| {
            i64::try_from(secs)
                .unwrap_or(i64::MAX)
                .clamp(1, MAX_EXPIRY_SECS)
        };
        Self {
            secret: settings.secret.clone(),
            access_token_expires_secs: clamp(settings.access_token_expiry_secs),
            refresh_token_expires_secs: clamp(settings.refresh_token_expiry_secs),
        }
    }
}

/// `now + secs`, or an encoding error when the instant is out of range.
fn expiry_after(secs: i64) -> Result<chrono::DateTime<Utc>, JwtError> {
    Duration::try_seconds(secs)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| JwtError::EncodingError(format!("token lifetime {secs}s out of range")))
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token is of the wrong kind for this use.
    #[error("wrong token kind")]
    WrongKind,
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &"[hidden]")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service with the given configuration.
    #[must_use]
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generates an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        role: &str,
        team_id: Option<Uuid>,
    ) -> Result<String, JwtError> {
        let expires_at = expiry_after(self.config.access_token_expires_secs)?;
        let claims = Claims::new(user_id, role, team_id, TokenKind::Access, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Generates a refresh token for a user.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::EncodingError` if token generation fails.
    pub fn generate_refresh_token(
        &self,
        user_id: Uuid,
        role: &str,
        team_id: Option<Uuid>,
    ) -> Result<String, JwtError> {
        let expires_at = expiry_after(self.config.refresh_token_expires_secs)?;
        let claims = Claims::new(user_id, role, team_id, TokenKind::Refresh, expires_at);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token of any kind.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::Expired` if the token has expired.
    /// Returns `JwtError::DecodingError` if the token is malformed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let validation = Validation::default();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }

    /// Validates a token and checks that it is of the expected kind.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::WrongKind` when a refresh token is presented where
    /// an access token is expected, or vice versa.
    pub fn validate_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, JwtError> {
        let claims = self.validate_token(token)?;
        if claims.kind != kind {
            return Err(JwtError::WrongKind);
        }
        Ok(claims)
    }

    /// Returns the access token expiration in seconds.
    #[must_use]
    pub const fn access_token_expires_in(&self) -> i64 {
        self.config.access_token_expires_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_secs: 900,
            refresh_token_expires_secs: 604_800,
        })
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();

        let token = service
            .generate_access_token(user_id, "teamlead", Some(team_id))
            .unwrap();
        let claims = service.validate_kind(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.team_id(), Some(team_id));
        assert_eq!(claims.role, "teamlead");
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let service = create_test_service();
        let token = service
            .generate_refresh_token(Uuid::new_v4(), "buyer", None)
            .unwrap();

        assert!(matches!(
            service.validate_kind(&token, TokenKind::Access),
            Err(JwtError::WrongKind)
        ));
        assert!(service.validate_kind(&token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();
        let result = service.validate_token("invalid.token.here");
        assert!(matches!(result, Err(JwtError::DecodingError(_))));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = JwtService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..JwtConfig::default()
        });
        let token = other
            .generate_access_token(Uuid::new_v4(), "admin", None)
            .unwrap();

        assert!(create_test_service().validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_secs: -300,
            refresh_token_expires_secs: 604_800,
        });
        let token = service
            .generate_access_token(Uuid::new_v4(), "admin", None)
            .unwrap();

        assert!(matches!(service.validate_token(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_from_file_settings() {
        let settings = crate::config::JwtConfig {
            secret: "s".to_string(),
            access_token_expiry_secs: 900,
            refresh_token_expiry_secs: 604_800,
        };
        let config = JwtConfig::from(&settings);
        assert_eq!(config.access_token_expires_secs, 900);
        assert_eq!(config.refresh_token_expires_secs, 604_800);
    }

    #[test]
    fn test_sub_minute_expiry_kept_in_seconds() {
        let settings = crate::config::JwtConfig {
            secret: "s".to_string(),
            access_token_expiry_secs: 90,
            refresh_token_expiry_secs: 3_600,
        };
        let service = JwtService::new(JwtConfig::from(&settings));
        assert_eq!(service.access_token_expires_in(), 90);

        let token = service
            .generate_access_token(Uuid::new_v4(), "admin", None)
            .unwrap();
        let claims = service.validate_token(&token).unwrap();
        let lifetime = claims.exp - claims.iat;
        assert!((89..=91).contains(&lifetime), "lifetime was {lifetime}");
    }

    #[test]
    fn test_file_settings_clamped() {
        let settings = crate::config::JwtConfig {
            secret: "s".to_string(),
            access_token_expiry_secs: 0,
            refresh_token_expiry_secs: u64::MAX,
        };
        let config = JwtConfig::from(&settings);
        assert_eq!(config.access_token_expires_secs, 1);
        assert_eq!(config.refresh_token_expires_secs, MAX_EXPIRY_SECS);
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let service = JwtService::new(JwtConfig {
            access_token_expires_secs: i64::MAX,
            ..JwtConfig::default()
        });
        assert!(matches!(
            service.generate_access_token(Uuid::new_v4(), "admin", None),
            Err(JwtError::EncodingError(_))
        ));
    }

    #[test]
    fn test_access_token_expires_in() {
        assert_eq!(create_test_service().access_token_expires_in(), 900);
    }
}
