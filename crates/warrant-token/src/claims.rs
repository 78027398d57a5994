//! Access token claims.

use crate::error::TokenError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use warrant_codec::Values;

/// Lifetime of issued access tokens unless configured otherwise.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Claim tags within the claims structure.
pub mod tags {
    use warrant_codec::Tag;

    pub const TENANT_ID: Tag = 1;
    pub const CLIENT_ID: Tag = 2;
    pub const NOT_BEFORE: Tag = 3;
    pub const NOT_AFTER: Tag = 4;
    pub const SCOPE: Tag = 5;

    /// Tags within the nested scope structure.
    pub const SCOPE_ADMIN: Tag = 1;
}

/// Scope granted by a token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Full administrative access.
    pub admin: bool,
}

impl Scope {
    pub fn admin() -> Self {
        Self { admin: true }
    }

    fn to_values(self) -> Values {
        Values::new().with(tags::SCOPE_ADMIN, self.admin)
    }

    fn from_values(values: &Values) -> Self {
        Self {
            admin: values.get_bool(tags::SCOPE_ADMIN).unwrap_or(false),
        }
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Tenant the client belongs to.
    pub tenant_id: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// Start of the validity window (Unix seconds).
    pub not_before: u64,

    /// End of the validity window (Unix seconds, exclusive).
    pub not_after: u64,

    /// Granted scope.
    pub scope: Scope,
}

impl Claims {
    /// Create claims valid from `not_before` for `lifetime`.
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        not_before: u64,
        lifetime: Duration,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            not_before,
            not_after: not_before.saturating_add(lifetime.as_secs()),
            scope: Scope::default(),
        }
    }

    /// Set the granted scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Length of the validity window.
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.not_after.saturating_sub(self.not_before))
    }

    /// Check the validity window at `now` (Unix seconds).
    pub fn check_validity_at(&self, now: u64) -> Result<(), TokenError> {
        if now < self.not_before {
            return Err(TokenError::TokenNotYetValid {
                not_before: self.not_before,
            });
        }
        if now >= self.not_after {
            return Err(TokenError::TokenExpired {
                expired_at: self.not_after,
            });
        }
        Ok(())
    }

    /// Check if the token has expired.
    pub fn is_expired(&self) -> bool {
        unix_now() >= self.not_after
    }

    /// Encode the claims as a codec structure.
    pub fn to_values(&self) -> Values {
        Values::new()
            .with(tags::TENANT_ID, self.tenant_id.as_str())
            .with(tags::CLIENT_ID, self.client_id.as_str())
            .with(tags::NOT_BEFORE, self.not_before)
            .with(tags::NOT_AFTER, self.not_after)
            .with(tags::SCOPE, self.scope.to_values())
    }

    /// Read claims from a codec structure.
    ///
    /// Entries with unknown tags are ignored.
    pub fn from_values(values: &Values) -> Result<Self, TokenError> {
        Ok(Self {
            tenant_id: required(values.get_str(tags::TENANT_ID), "tenant_id")?.to_string(),
            client_id: required(values.get_str(tags::CLIENT_ID), "client_id")?.to_string(),
            not_before: required(values.get_u64(tags::NOT_BEFORE), "not_before")?,
            not_after: required(values.get_u64(tags::NOT_AFTER), "not_after")?,
            scope: Scope::from_values(required(values.get_nested(tags::SCOPE), "scope")?),
        })
    }
}

fn required<T>(value: Option<T>, claim: &'static str) -> Result<T, TokenError> {
    value.ok_or(TokenError::MissingClaim { claim })
}

/// Current time as Unix seconds.
pub fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Claims {
        Claims::new("AAECAwQFBgc", "client-1", 1_700_000_000, DEFAULT_TOKEN_LIFETIME)
            .with_scope(Scope::admin())
    }

    #[test]
    fn test_claims_creation() {
        let claims = sample();
        assert_eq!(claims.not_after - claims.not_before, 86_400);
        assert_eq!(claims.lifetime(), DEFAULT_TOKEN_LIFETIME);
        assert!(claims.scope.admin);
    }

    #[test]
    fn test_values_roundtrip() {
        let claims = sample();
        let values = claims.to_values();
        assert_eq!(values.get_str(tags::CLIENT_ID), Some("client-1"));
        assert_eq!(
            values.get_nested(tags::SCOPE).and_then(|s| s.get_bool(tags::SCOPE_ADMIN)),
            Some(true)
        );
        assert_eq!(Claims::from_values(&values).unwrap(), claims);
    }

    #[test]
    fn test_unknown_claims_ignored() {
        let values = sample().to_values().with(42, "extension");
        assert_eq!(Claims::from_values(&values).unwrap(), sample());
    }

    #[test]
    fn test_missing_claim() {
        let mut values = sample().to_values();
        values.remove(tags::CLIENT_ID);
        assert!(matches!(
            Claims::from_values(&values),
            Err(TokenError::MissingClaim { claim: "client_id" })
        ));
    }

    #[test]
    fn test_validity_window() {
        let claims = sample();
        assert!(claims.check_validity_at(claims.not_before).is_ok());
        assert!(claims.check_validity_at(claims.not_after - 1).is_ok());
        assert!(matches!(
            claims.check_validity_at(claims.not_before - 1),
            Err(TokenError::TokenNotYetValid { .. })
        ));
        assert!(matches!(
            claims.check_validity_at(claims.not_after),
            Err(TokenError::TokenExpired { .. })
        ));
        assert!(claims.is_expired());
    }
}
