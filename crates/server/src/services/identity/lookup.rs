//! Identity provider account lookup client.
//!
//! Verifies an ID token by posting it to the provider's `accounts:lookup`
//! endpoint, which checks signature and expiry and returns the account the
//! token belongs to. Successful lookups are cached with `moka` until the
//! configured TTL or the token's own `exp` claim, whichever comes first.
//! Failures, and tokens whose expiry cannot be read, are never cached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use moka::Expiry;
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{IdentityError, IdentityVerifier};
use crate::config::IdentityConfig;
use crate::models::Identity;

/// Upper bound on cached tokens.
const CACHE_CAPACITY: u64 = 10_000;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    disabled: bool,
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    exp: Option<i64>,
}

/// The `exp` claim of a JWT, read without verifying the signature.
///
/// Only used to bound how long a lookup the provider already accepted may be
/// reused; never as proof of validity.
fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// A verified identity and how long it may be served from the cache.
#[derive(Debug, Clone)]
struct CachedIdentity {
    identity: Identity,
    lifetime: Duration,
}

/// Expires each entry after its own lifetime.
struct TokenLifetime;

impl Expiry<String, CachedIdentity> for TokenLifetime {
    fn expire_after_create(
        &self,
        _token: &String,
        value: &CachedIdentity,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.lifetime)
    }
}

/// How long a freshly verified token may be cached: `min(ttl, exp - now)`.
///
/// `None` if the token carries no readable expiry or has already expired.
fn cache_lifetime(token: &str, ttl: Duration, now: DateTime<Utc>) -> Option<Duration> {
    let remaining = (token_expiry(token)? - now).to_std().ok()?;
    let lifetime = remaining.min(ttl);
    (!lifetime.is_zero()).then_some(lifetime)
}

/// Verifier that asks the identity provider about each (uncached) token.
#[derive(Clone)]
pub struct AccountLookupVerifier {
    inner: Arc<AccountLookupVerifierInner>,
}

struct AccountLookupVerifierInner {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    api_key: SecretString,
    cache_ttl: Duration,
    cache: Option<Cache<String, CachedIdentity>>,
}

impl AccountLookupVerifier {
    /// Create a verifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is not a valid URL or the HTTP client
    /// fails to build.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let endpoint = reqwest::Url::parse(&config.endpoint)
            .map_err(|e| IdentityError::Parse(format!("invalid lookup endpoint: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let cache = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .expire_after(TokenLifetime)
                .build()
        });

        Ok(Self {
            inner: Arc::new(AccountLookupVerifierInner {
                client,
                endpoint,
                api_key: config.api_key.clone(),
                cache_ttl: config.cache_ttl,
                cache,
            }),
        })
    }

    #[instrument(skip_all)]
    async fn lookup(&self, token: &str) -> Result<Identity, IdentityError> {
        let mut url = self.inner.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());

        let response = self
            .inner
            .client
            .post(url)
            .json(&LookupRequest { id_token: token })
            .send()
            .await?;

        let status = response.status();

        // The provider answers 400 for malformed, expired and revoked tokens
        if status == reqwest::StatusCode::BAD_REQUEST {
            debug!("Identity provider rejected token");
            return Err(IdentityError::InvalidToken);
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(IdentityError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        let user = body
            .users
            .into_iter()
            .next()
            .ok_or(IdentityError::InvalidToken)?;

        if user.disabled {
            debug!(user_id = %user.local_id, "Token belongs to a disabled account");
            return Err(IdentityError::InvalidToken);
        }

        Ok(Identity::new(user.local_id, user.email))
    }
}

impl IdentityVerifier for AccountLookupVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<Identity, IdentityError>> {
        async move {
            let Some(cache) = &self.inner.cache else {
                return self.lookup(token).await;
            };

            if let Some(cached) = cache.get(token).await {
                debug!("Cache hit for verified token");
                return Ok(cached.identity);
            }

            let identity = self.lookup(token).await?;
            if let Some(lifetime) = cache_lifetime(token, self.inner.cache_ttl, Utc::now()) {
                let cached = CachedIdentity {
                    identity: identity.clone(),
                    lifetime,
                };
                cache.insert(token.to_string(), cached).await;
            }
            Ok(identity)
        }
        .boxed()
    }
}
