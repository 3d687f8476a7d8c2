//! Access to the current session credential.

use herald_telemetry::masking::Sensitive;
use parking_lot::RwLock;

/// Supplies the bearer token for REST calls.
///
/// Token refresh happens elsewhere; implementations only report the
/// current value.
pub trait SessionProvider: Send + Sync {
    /// Returns the current access token, if signed in.
    fn access_token(&self) -> Option<String>;
}

/// A token that can be replaced or revoked at runtime.
#[derive(Debug, Default)]
pub struct StaticToken {
    token: RwLock<Option<Sensitive<String>>>,
}

impl StaticToken {
    /// Creates a provider holding `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(Sensitive::new(token.into()))),
        }
    }

    /// Replaces the token.
    pub fn set(&self, token: impl Into<String>) {
        *self.token.write() = Some(Sensitive::new(token.into()));
    }

    /// Drops the token.
    pub fn revoke(&self) {
        *self.token.write() = None;
    }
}

impl SessionProvider for StaticToken {
    fn access_token(&self) -> Option<String> {
        self.token
            .read()
            .as_ref()
            .map(|t| t.expose().clone())
            .filter(|t| !t.trim().is_empty())
    }
}
