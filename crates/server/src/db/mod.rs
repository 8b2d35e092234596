//! Document store used by every service.
//!
//! Data is addressed by collection + document id and stored as JSON objects.
//!
//! ## Collections
//!
//! - `menu` - Menu items, keyed by fixed catalog id
//! - `orders` - Placed orders, keyed by store-assigned id
//! - `counters` - Named counters (`queue` holds the highest assigned queue number)
//! - `users` - User profiles, keyed by identity-provider user id
//!
//! ## Implementations
//!
//! - [`PgDocumentStore`] - `PostgreSQL` JSONB table (production)
//! - [`MemoryDocumentStore`] - process-local maps (development and tests)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p food-order-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryDocumentStore;
pub use postgres::{MIGRATOR, PgDocumentStore, create_pool};

use crate::config::ServerConfig;

/// Collection holding menu items.
pub const MENU: &str = "menu";
/// Collection holding placed orders.
pub const ORDERS: &str = "orders";
/// Collection holding named counters.
pub const COUNTERS: &str = "counters";
/// Collection holding user profiles.
pub const USERS: &str = "users";

/// The fields of a document: a JSON object.
pub type Fields = serde_json::Map<String, Value>;

/// Pure read-modify-write step run inside [`DocumentStore::transact`].
///
/// Receives the current fields (`None` if the document does not exist) and
/// returns the fields to write. It may run more than once when the store
/// retries a conflicting transaction, so it must not have side effects.
pub type UpdateFn<'a> = Box<dyn Fn(Option<&Fields>) -> Result<Fields, StoreError> + Send + Sync + 'a>;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or does not match the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A transaction's update function refused to produce a new value.
    #[error("transaction aborted: {0}")]
    Aborted(String),

    /// A query named a collection or field the store cannot address.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A concurrent transaction touched the same document. Retried internally.
    #[error("transaction conflict")]
    Conflict,

    /// Every transaction attempt hit a conflict.
    #[error("transaction contention exhausted after {attempts} attempts")]
    ContentionExhausted {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// The store rejected the operation (connection lost, collection offline).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id, unique within its collection.
    pub id: String,
    /// Document fields.
    pub fields: Fields,
}

impl Document {
    /// Create a document from an id and fields.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decode the document fields into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataCorruption` if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            StoreError::DataCorruption(format!("document {} does not decode: {e}", self.id))
        })
    }

    /// Decode the fields with the document id merged in as an `id` field.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataCorruption` if the merged fields do not match `T`.
    pub fn decode_with_id<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            StoreError::DataCorruption(format!("document {} does not decode: {e}", self.id))
        })
    }
}

/// Encode a typed value as document fields.
///
/// # Errors
///
/// Returns `StoreError::DataCorruption` if `value` does not serialize to a JSON object.
pub fn encode<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(StoreError::DataCorruption(format!(
            "expected a JSON object, got {other}"
        ))),
        Err(e) => Err(StoreError::DataCorruption(format!("failed to encode: {e}"))),
    }
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A single-collection query: optional equality filter, ordering and limit.
///
/// Ties on the ordering field are broken by insertion order, in the same
/// direction as the ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filter: Option<(String, Value)>,
    order_by: Option<(String, Direction)>,
    limit: Option<usize>,
}

impl Query {
    /// An unfiltered, unordered, unlimited query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only documents whose top-level `field` equals `value`.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    /// Order results by a top-level field.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Return at most `limit` documents.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The equality filter, if any.
    #[must_use]
    pub fn filter(&self) -> Option<(&str, &Value)> {
        self.filter.as_ref().map(|(field, value)| (field.as_str(), value))
    }

    /// The ordering, if any.
    #[must_use]
    pub fn ordering(&self) -> Option<(&str, Direction)> {
        self.order_by
            .as_ref()
            .map(|(field, direction)| (field.as_str(), *direction))
    }

    /// The limit, if any.
    #[must_use]
    pub const fn max_results(&self) -> Option<usize> {
        self.limit
    }
}

/// A document database with collection/id addressing and atomic
/// read-modify-write transactions.
///
/// # Dyn Compatibility
///
/// Methods return `BoxFuture` instead of using `async fn` so the store can be
/// shared as `Arc<dyn DocumentStore>` in application state.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id.
    fn get<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, StoreError>>;

    /// Fetch every document in a collection, ordered by id.
    fn list<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Document>, StoreError>>;

    /// Run a [`Query`] against a collection.
    fn query<'a>(
        &'a self,
        collection: &'a str,
        query: &'a Query,
    ) -> BoxFuture<'a, Result<Vec<Document>, StoreError>>;

    /// Create a document with a store-assigned id.
    fn add<'a>(
        &'a self,
        collection: &'a str,
        fields: Fields,
    ) -> BoxFuture<'a, Result<Document, StoreError>>;

    /// Create or replace a document.
    fn set<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        fields: Fields,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Create or replace several documents in one atomic batch.
    fn set_all<'a>(
        &'a self,
        collection: &'a str,
        documents: Vec<Document>,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Atomically read a document, apply `update` and write the result.
    ///
    /// Concurrent transactions on the same document are serialized: no two
    /// of them can observe the same pre-update state. Conflicting attempts are
    /// retried with fresh state up to the store's attempt budget, after which
    /// `StoreError::ContentionExhausted` is returned and nothing is written.
    fn transact<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        update: UpdateFn<'a>,
    ) -> BoxFuture<'a, Result<Document, StoreError>>;

    /// Check that the store is reachable.
    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}

/// Build the document store described by the configuration.
///
/// Without a database URL the server runs on the in-memory store, which
/// loses everything on restart.
///
/// # Errors
///
/// Returns `StoreError::Database` if the `PostgreSQL` pool cannot be created.
pub async fn create_store(config: &ServerConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            tracing::info!("Database pool created");
            Ok(Arc::new(PgDocumentStore::new(
                pool,
                config.transaction_max_attempts,
            )))
        }
        None => {
            tracing::warn!("No database URL configured, using in-memory document store");
            Ok(Arc::new(MemoryDocumentStore::with_max_attempts(
                config.transaction_max_attempts,
            )))
        }
    }
}

/// Run one transaction attempt at a time until it stops conflicting.
pub(crate) async fn with_retries<T, F, Fut>(
    max_attempts: u32,
    collection: &str,
    id: &str,
    mut attempt: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    for n in 1..=max_attempts {
        match attempt().await {
            Err(StoreError::Conflict) => {
                tracing::debug!(collection, id, attempt = n, "Transaction conflict, retrying");
                tokio::time::sleep(Duration::from_millis(u64::from(n) * 2)).await;
            }
            other => return other,
        }
    }

    tracing::warn!(collection, id, attempts = max_attempts, "Transaction contention exhausted");
    Err(StoreError::ContentionExhausted {
        attempts: max_attempts,
    })
}

/// Total order over JSON values used when sorting by a document field.
///
/// Missing and null values sort first, then booleans, numbers, strings.
/// Arrays and objects compare equal to each other.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_) | Value::Object(_)) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_encode_decode() {
        let sample = Sample {
            name: "burger".to_string(),
            count: 2,
        };
        let fields = encode(&sample).unwrap();
        assert_eq!(fields.get("name"), Some(&json!("burger")));

        let doc = Document::new("1", fields);
        assert_eq!(doc.decode::<Sample>().unwrap(), sample);
    }

    #[test]
    fn test_decode_with_id_uses_document_id() {
        #[derive(Debug, Deserialize)]
        struct WithId {
            id: String,
            name: String,
        }

        let mut fields = Fields::new();
        fields.insert("name".to_string(), json!("Pizza"));
        fields.insert("id".to_string(), json!("stale"));

        let decoded: WithId = Document::new("2", fields).decode_with_id().unwrap();
        assert_eq!(decoded.id, "2");
        assert_eq!(decoded.name, "Pizza");
    }

    #[test]
    fn test_encode_rejects_non_objects() {
        assert!(matches!(
            encode(&42),
            Err(StoreError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_decode_reports_corruption() {
        let doc = Document::new("broken", Fields::new());
        let err = doc.decode::<Sample>().unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_query_builder() {
        let query = Query::new()
            .where_eq("userId", "u1")
            .order_by("createdAt", Direction::Descending)
            .limit(20);

        assert_eq!(query.filter(), Some(("userId", &json!("u1"))));
        assert_eq!(query.ordering(), Some(("createdAt", Direction::Descending)));
        assert_eq!(query.max_results(), Some(20));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(
            compare_values(Some(&json!(2)), Some(&json!(10))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("2026-01-02")), Some(&json!("2026-01-01"))),
            Ordering::Greater
        );
        assert_eq!(compare_values(None, Some(&json!(0))), Ordering::Less);
    }

    #[tokio::test]
    async fn test_with_retries_gives_up_after_budget() {
        let mut calls = 0;
        let result: Result<(), StoreError> = with_retries(3, "counters", "queue", || {
            calls += 1;
            async { Err(StoreError::Conflict) }
        })
        .await;

        assert!(matches!(
            result,
            Err(StoreError::ContentionExhausted { attempts: 3 })
        ));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_with_retries_stops_on_success() {
        let mut calls = 0;
        let result = with_retries(5, "counters", "queue", || {
            calls += 1;
            let outcome = if calls < 2 {
                Err(StoreError::Conflict)
            } else {
                Ok(calls)
            };
            async move { outcome }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
    }
}
