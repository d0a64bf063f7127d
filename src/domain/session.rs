//! Explicit credential context for backend calls.
//!
//! Replaces process-wide token storage: whoever builds an adapter decides
//! which token (if any) its requests carry.

use std::fmt;

/// Environment variable consulted when no token is given explicitly.
pub const TOKEN_ENV: &str = "INTAKE_TOKEN";

/// Bearer credentials attached to outgoing requests.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    token: Option<String>,
}

impl SessionContext {
    /// Anonymous context, used by applicants submitting public forms
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Context carrying a bearer token
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            return Self::anonymous();
        }
        Self { token: Some(token) }
    }

    /// Token given explicitly, falling back to the environment
    pub fn from_token_or_env(token: Option<String>) -> Self {
        match token.or_else(|| std::env::var(TOKEN_ENV).ok()) {
            Some(token) => Self::with_token(token),
            None => Self::anonymous(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }
}

// Never print the token itself.
impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header() {
        let ctx = SessionContext::with_token("abc123");
        assert_eq!(ctx.authorization().as_deref(), Some("Bearer abc123"));
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn test_blank_token_is_anonymous() {
        let ctx = SessionContext::with_token("  ");
        assert!(!ctx.is_authenticated());
        assert!(ctx.authorization().is_none());
    }

    #[test]
    fn test_debug_hides_token() {
        let ctx = SessionContext::with_token("secret-value");
        let printed = format!("{:?}", ctx);
        assert!(!printed.contains("secret-value"));
    }
}
