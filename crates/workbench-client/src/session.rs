//! Session store: source of the auth token attached to every request.

use parking_lot::RwLock;

/// Provides the process-wide auth/session token
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Current token, `None` when signed out
    fn token(&self) -> Option<String>;
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct InMemorySession {
    token: RwLock<Option<String>>,
}

impl InMemorySession {
    /// Creates an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session holding `token`
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Replaces the token
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    /// Signs out
    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

impl SessionStore for InMemorySession {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lifecycle() {
        let session = InMemorySession::new();
        assert_eq!(session.token(), None);

        session.set_token("abc");
        assert_eq!(session.token().as_deref(), Some("abc"));

        session.clear();
        assert_eq!(session.token(), None);
    }
}
