//! The verified caller of a request.

use food_order_core::UserId;

/// Email recorded on orders when the identity provider has none for the caller.
pub const ANONYMOUS_EMAIL: &str = "anonymous";

/// A subject whose bearer token was verified by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider-assigned user id.
    pub user_id: UserId,
    /// Email on the provider account, if any.
    pub email: Option<String>,
}

impl Identity {
    /// Create an identity.
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
        }
    }

    /// The email to record as order owner, `"anonymous"` when unknown.
    #[must_use]
    pub fn email_or_anonymous(&self) -> &str {
        self.email
            .as_deref()
            .filter(|email| !email.is_empty())
            .unwrap_or(ANONYMOUS_EMAIL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_or_anonymous() {
        let known = Identity::new("u1", Some("diner@example.com".to_string()));
        assert_eq!(known.email_or_anonymous(), "diner@example.com");

        assert_eq!(Identity::new("u1", None).email_or_anonymous(), "anonymous");
        assert_eq!(
            Identity::new("u1", Some(String::new())).email_or_anonymous(),
            "anonymous"
        );
    }
}
