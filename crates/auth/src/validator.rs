//! Token validation seam.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::AuthToken;

/// Outcome of a token check.
///
/// `Unreachable` is the technical/transient surface: the validator could
/// not be consulted (timeout, backend down). Callers treat it as
/// retryable, never as a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenVerdict {
    Valid,
    Expired,
    Invalid,
    Unreachable,
}

/// External token validator.
///
/// Implementations own their transport and must bound their own timeouts;
/// a call that cannot complete in time reports `Unreachable` rather than
/// blocking the caller indefinitely.
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &AuthToken, now: DateTime<Utc>) -> TokenVerdict;
}

/// Validity window of an issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWindow {
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TokenWindow {
    /// Deterministic window check: valid iff `issued_at <= now < expires_at`.
    pub fn verdict_at(&self, now: DateTime<Utc>) -> TokenVerdict {
        if self.expires_at <= self.issued_at {
            // Malformed window; never accept.
            return TokenVerdict::Invalid;
        }
        if now >= self.expires_at {
            return TokenVerdict::Expired;
        }
        if now < self.issued_at {
            return TokenVerdict::Invalid;
        }
        TokenVerdict::Valid
    }
}

/// In-memory validator over a table of issued tokens.
#[derive(Debug, Default)]
pub struct StaticTokenValidator {
    issued: RwLock<HashMap<AuthToken, TokenWindow>>,
}

impl StaticTokenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a token as issued for the given window.
    pub fn issue(&self, token: AuthToken, window: TokenWindow) {
        if let Ok(mut issued) = self.issued.write() {
            issued.insert(token, window);
        }
    }

    /// Issue a token valid from `now` for `ttl`.
    pub fn issue_for(&self, token: AuthToken, now: DateTime<Utc>, ttl: chrono::Duration) {
        self.issue(
            token,
            TokenWindow {
                issued_at: now,
                expires_at: now + ttl,
            },
        );
    }
}

impl TokenValidator for StaticTokenValidator {
    fn validate(&self, token: &AuthToken, now: DateTime<Utc>) -> TokenVerdict {
        let issued = match self.issued.read() {
            Ok(issued) => issued,
            Err(_) => return TokenVerdict::Unreachable,
        };
        match issued.get(token) {
            Some(window) => window.verdict_at(now),
            None => TokenVerdict::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(raw: &str) -> AuthToken {
        AuthToken::new(raw).unwrap()
    }

    #[test]
    fn unknown_token_is_invalid() {
        let validator = StaticTokenValidator::new();
        assert_eq!(
            validator.validate(&token("3zQ74sSawCfWza05"), Utc::now()),
            TokenVerdict::Invalid
        );
    }

    #[test]
    fn token_valid_inside_window() {
        let validator = StaticTokenValidator::new();
        let now = Utc::now();
        validator.issue_for(token("8zQ74sSawCfWza05"), now, Duration::minutes(30));
        assert_eq!(
            validator.validate(&token("8zQ74sSawCfWza05"), now + Duration::minutes(29)),
            TokenVerdict::Valid
        );
    }

    #[test]
    fn token_expires_at_window_end() {
        let validator = StaticTokenValidator::new();
        let now = Utc::now();
        validator.issue_for(token("8zQ74sSawCfWza05"), now, Duration::minutes(30));
        assert_eq!(
            validator.validate(&token("8zQ74sSawCfWza05"), now + Duration::minutes(30)),
            TokenVerdict::Expired
        );
    }

    #[test]
    fn token_not_yet_valid_is_invalid() {
        let validator = StaticTokenValidator::new();
        let now = Utc::now();
        validator.issue(
            token("8zQ74sSawCfWza05"),
            TokenWindow {
                issued_at: now + Duration::minutes(5),
                expires_at: now + Duration::minutes(35),
            },
        );
        assert_eq!(
            validator.validate(&token("8zQ74sSawCfWza05"), now),
            TokenVerdict::Invalid
        );
    }

    #[test]
    fn inverted_window_never_validates() {
        let window = TokenWindow {
            issued_at: Utc::now(),
            expires_at: Utc::now() - Duration::minutes(1),
        };
        assert_eq!(window.verdict_at(Utc::now()), TokenVerdict::Invalid);
    }
}
