//! Bearer token verification.
//!
//! Handlers never see raw tokens: the auth extractor hands the token to an
//! [`IdentityVerifier`] and continues with the resulting [`Identity`].

mod lookup;

use std::collections::HashMap;

use futures::FutureExt;
use futures::future::BoxFuture;
use thiserror::Error;

pub use lookup::AccountLookupVerifier;

use crate::models::Identity;

/// Errors that can occur while verifying a bearer token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token is malformed, expired, revoked or unknown.
    #[error("invalid or expired token")]
    InvalidToken,

    /// HTTP request to the identity provider failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The identity provider returned an unexpected error.
    #[error("identity provider error: {status} - {message}")]
    Provider { status: u16, message: String },

    /// The identity provider's response could not be understood.
    #[error("parse error: {0}")]
    Parse(String),
}

impl IdentityError {
    /// Whether the failure is the caller's fault (as opposed to a provider outage).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidToken)
    }
}

/// Verifies bearer tokens.
///
/// # Dyn Compatibility
///
/// Returns `BoxFuture` so the verifier can live in application state as
/// `Arc<dyn IdentityVerifier>`.
pub trait IdentityVerifier: Send + Sync {
    /// Resolve a bearer token to the identity it was issued for.
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Identity, IdentityError>>;
}

/// Verifier backed by a fixed token table.
///
/// Used for local development and tests; never talks to the network.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticIdentityVerifier {
    /// Create a verifier that rejects every token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as proof of `identity`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

impl IdentityVerifier for StaticIdentityVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Identity, IdentityError>> {
        let result = self
            .tokens
            .get(token)
            .cloned()
            .ok_or(IdentityError::InvalidToken);
        async move { result }.boxed()
    }
}
