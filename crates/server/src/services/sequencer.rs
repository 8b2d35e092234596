//! Queue number assignment.
//!
//! The queue counter is a single document (`counters/queue`) holding the
//! highest number handed out so far in its `value` field. Every call to
//! [`QueueSequencer::next_queue_number`] increments it inside one store
//! transaction, so:
//!
//! - no two calls ever receive the same number, however they interleave
//! - numbers follow transaction commit order
//! - the first number ever assigned is 1 (the document is created lazily)
//!
//! A number is consumed as soon as the transaction commits. Nothing here rolls
//! the counter back, and nothing deduplicates retried calls.

use std::sync::Arc;

use food_order_core::QueueNumber;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::db::{COUNTERS, DocumentStore, Fields, StoreError};

/// Document id of the order queue counter.
pub const QUEUE_COUNTER_ID: &str = "queue";

/// Field of the counter document holding the last assigned number.
pub const COUNTER_VALUE_FIELD: &str = "value";

/// Errors that can occur while assigning a queue number.
#[derive(Debug, Error)]
pub enum SequencerError {
    /// The counter transaction could not be committed.
    #[error("counter transaction failed: {0}")]
    Store(#[from] StoreError),

    /// The counter document holds something other than a positive integer.
    #[error("queue counter is corrupt: {0}")]
    CorruptCounter(String),

    /// The counter cannot be incremented any further.
    #[error("queue counter exhausted")]
    Exhausted,
}

/// Produces strictly increasing queue numbers.
///
/// Each successful call consumes exactly one number.
pub trait QueueSequencer: Send + Sync {
    /// Assign the next queue number.
    fn next_queue_number(&self) -> BoxFuture<'_, Result<QueueNumber, SequencerError>>;

    /// The last assigned queue number, `None` before the first order.
    fn current(&self) -> BoxFuture<'_, Result<Option<QueueNumber>, SequencerError>>;
}

/// Sequencer backed by the `counters/queue` document.
#[derive(Clone)]
pub struct OrderSequencer {
    store: Arc<dyn DocumentStore>,
}

impl OrderSequencer {
    /// Create a sequencer over a document store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

/// Read the counter value out of a counter document.
fn read_counter(fields: &Fields) -> Result<Option<QueueNumber>, String> {
    match fields.get(COUNTER_VALUE_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(QueueNumber::new)
            .ok_or_else(|| format!("expected an unsigned integer, got {value}")),
    }
}

fn counter_fields(number: QueueNumber) -> Fields {
    let mut fields = Fields::new();
    fields.insert(COUNTER_VALUE_FIELD.to_string(), Value::from(number.get()));
    fields
}

/// Update step for the counter transaction: `None -> 1`, `n -> n + 1`.
fn increment(current: Option<&Fields>) -> Result<Fields, StoreError> {
    let current = match current {
        Some(fields) => read_counter(fields).map_err(StoreError::DataCorruption)?,
        None => None,
    };

    let next = QueueNumber::after(current)
        .ok_or_else(|| StoreError::Aborted("queue counter exhausted".to_string()))?;

    Ok(counter_fields(next))
}

impl QueueSequencer for OrderSequencer {
    fn next_queue_number(&self) -> BoxFuture<'_, Result<QueueNumber, SequencerError>> {
        async move {
            let document = self
                .store
                .transact(COUNTERS, QUEUE_COUNTER_ID, Box::new(increment))
                .await
                .map_err(|err| match err {
                    StoreError::DataCorruption(detail) => SequencerError::CorruptCounter(detail),
                    StoreError::Aborted(_) => SequencerError::Exhausted,
                    other => SequencerError::Store(other),
                })?;

            read_counter(&document.fields)
                .map_err(SequencerError::CorruptCounter)?
                .ok_or_else(|| SequencerError::CorruptCounter("counter written without a value".to_string()))
        }
        .boxed()
    }

    fn current(&self) -> BoxFuture<'_, Result<Option<QueueNumber>, SequencerError>> {
        async move {
            let Some(document) = self.store.get(COUNTERS, QUEUE_COUNTER_ID).await? else {
                return Ok(None);
            };
            read_counter(&document.fields).map_err(SequencerError::CorruptCounter)
        }
        .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;
    use crate::db::MemoryDocumentStore;

    fn sequencer() -> (Arc<MemoryDocumentStore>, OrderSequencer) {
        let store = Arc::new(MemoryDocumentStore::new());
        let sequencer = OrderSequencer::new(store.clone());
        (store, sequencer)
    }

    #[tokio::test]
    async fn test_first_number_is_one() {
        let (_, sequencer) = sequencer();
        assert_eq!(sequencer.current().await.unwrap(), None);

        let first = sequencer.next_queue_number().await.unwrap();
        assert_eq!(first, QueueNumber::FIRST);
        assert_eq!(sequencer.current().await.unwrap(), Some(QueueNumber::FIRST));
    }

    #[tokio::test]
    async fn test_numbers_increase_by_one() {
        let (_, sequencer) = sequencer();
        let mut previous = sequencer.next_queue_number().await.unwrap();
        for _ in 0..10 {
            let next = sequencer.next_queue_number().await.unwrap();
            assert_eq!(next.get(), previous.get() + 1);
            previous = next;
        }
    }

    #[tokio::test]
    async fn test_continues_from_existing_counter() {
        let (store, sequencer) = sequencer();
        let mut fields = Fields::new();
        fields.insert("value".to_string(), json!(41));
        store.set(COUNTERS, QUEUE_COUNTER_ID, fields).await.unwrap();

        assert_eq!(sequencer.next_queue_number().await.unwrap().get(), 42);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_get_distinct_gap_free_numbers() {
        let (_, sequencer) = sequencer();

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let sequencer = sequencer.clone();
                tokio::spawn(async move { sequencer.next_queue_number().await })
            })
            .collect();

        let mut numbers = HashSet::new();
        for handle in handles {
            let number = handle.await.unwrap().unwrap();
            assert!(numbers.insert(number.get()), "duplicate queue number {number}");
        }

        assert_eq!(numbers, (1..=64).collect::<HashSet<u64>>());
    }

    #[tokio::test]
    async fn test_contention_exhausted_consumes_nothing() {
        let store = Arc::new(MemoryDocumentStore::with_max_attempts(2));
        let sequencer = OrderSequencer::new(store.clone());
        store.inject_conflicts(2);

        let err = sequencer.next_queue_number().await.unwrap_err();
        assert!(matches!(
            err,
            SequencerError::Store(StoreError::ContentionExhausted { attempts: 2 })
        ));
        assert_eq!(sequencer.current().await.unwrap(), None);

        // The next uncontended call still starts at 1
        assert_eq!(sequencer.next_queue_number().await.unwrap(), QueueNumber::FIRST);
    }

    #[tokio::test]
    async fn test_corrupt_counter_is_reported() {
        let (store, sequencer) = sequencer();
        let mut fields = Fields::new();
        fields.insert("value".to_string(), json!("seven"));
        store.set(COUNTERS, QUEUE_COUNTER_ID, fields).await.unwrap();

        let err = sequencer.next_queue_number().await.unwrap_err();
        assert!(matches!(err, SequencerError::CorruptCounter(_)));
    }

    #[test]
    fn test_increment() {
        assert_eq!(increment(None).unwrap()["value"], 1);

        let current = counter_fields(QueueNumber::new(9).unwrap());
        assert_eq!(increment(Some(&current)).unwrap()["value"], 10);

        let mut maxed = Fields::new();
        maxed.insert("value".to_string(), json!(u64::MAX));
        assert!(matches!(increment(Some(&maxed)), Err(StoreError::Aborted(_))));
    }
}
