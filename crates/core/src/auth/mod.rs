//! Authentication, roles and the permission table.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - User role definitions
//! - The static role → permission lookup used by every route
//! - Row-scope checks (own team, own records)

mod password;
mod permissions;

pub use password::{MIN_PASSWORD_LENGTH, PasswordError, hash_password, verify_password};
pub use permissions::{Actor, Permission};

use serde::{Deserialize, Serialize};

/// Back-office user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access.
    Admin,
    /// Salaries, payments, expenses and company-wide reporting.
    Finance,
    /// Manages flows and stats of one team.
    TeamLead,
    /// Media buyer; reports daily stats on assigned flows.
    Buyer,
    /// Business development; owns partner requests.
    BizDev,
}

impl UserRole {
    /// All roles, in privilege order.
    pub const ALL: [Self; 5] = [
        Self::Admin,
        Self::Finance,
        Self::TeamLead,
        Self::Buyer,
        Self::BizDev,
    ];

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Finance => "finance",
            Self::TeamLead => "teamlead",
            Self::Buyer => "buyer",
            Self::BizDev => "bizdev",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "finance" => Some(Self::Finance),
            "teamlead" => Some(Self::TeamLead),
            "buyer" => Some(Self::Buyer),
            "bizdev" => Some(Self::BizDev),
            _ => None,
        }
    }

    /// Returns true if this role sees every record regardless of team.
    #[must_use]
    pub const fn sees_everything(&self) -> bool {
        matches!(self, Self::Admin | Self::Finance)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_round_trip() {
        for role in UserRole::ALL {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserRole::parse(" TeamLead "), Some(UserRole::TeamLead));
        assert_eq!(UserRole::parse("owner"), None);
    }

    #[test]
    fn test_sees_everything() {
        assert!(UserRole::Admin.sees_everything());
        assert!(UserRole::Finance.sees_everything());
        assert!(!UserRole::TeamLead.sees_everything());
        assert!(!UserRole::Buyer.sees_everything());
        assert!(!UserRole::BizDev.sees_everything());
    }
}
