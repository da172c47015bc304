//! Authentication types for JWT and tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes short-lived access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Used on every API call.
    Access,
    /// Only accepted by the refresh endpoint.
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// User's role.
    pub role: String,
    /// Team the user belongs to, if any.
    #[serde(default)]
    pub team: Option<Uuid>,
    /// Token kind.
    pub kind: TokenKind,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        role: &str,
        team_id: Option<Uuid>,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role: role.to_string(),
            team: team_id,
            kind,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Returns the team ID from claims.
    #[must_use]
    pub const fn team_id(&self) -> Option<Uuid> {
        self.team
    }
}

/// Token pair returned after successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived).
    pub access_token: String,
    /// Refresh token (long-lived).
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_sets_expiration_and_iat() {
        let user = Uuid::new_v4();
        let team = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::minutes(30);
        let before = Utc::now().timestamp();
        let claims = Claims::new(user, "buyer", Some(team), TokenKind::Access, expires_at);
        let after = Utc::now().timestamp();

        assert_eq!(claims.user_id(), user);
        assert_eq!(claims.team_id(), Some(team));
        assert_eq!(claims.role, "buyer");
        assert!(claims.iat >= before && claims.iat <= after);
        assert_eq!(claims.exp, expires_at.timestamp());
    }

    #[test]
    fn test_token_kind_serialization() {
        let value = serde_json::to_value(TokenKind::Refresh).unwrap();
        assert_eq!(value, serde_json::json!("refresh"));
    }

    #[test]
    fn test_claims_without_team_deserialize() {
        let json = serde_json::json!({
            "sub": Uuid::nil(),
            "role": "admin",
            "kind": "access",
            "iat": 1,
            "exp": 2
        });
        let claims: Claims = serde_json::from_value(json).unwrap();
        assert!(claims.team.is_none());
    }
}
