//! In-memory implementation of the document store.
//!
//! Used when no database is configured and throughout the test suite. All
//! state sits behind one mutex that is never held across an `.await`, so every
//! operation (including `transact`) is trivially serializable.
//!
//! Test hooks:
//! - [`MemoryDocumentStore::write_count`] counts successful mutations
//! - [`MemoryDocumentStore::inject_conflicts`] makes the next transaction attempts conflict
//! - [`MemoryDocumentStore::fail_writes_to`] makes every write to a collection fail

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::BoxFuture;
use uuid::Uuid;

use super::{
    Direction, Document, DocumentStore, Fields, Query, StoreError, UpdateFn, compare_values,
    with_retries,
};

/// Default transaction attempt budget, matching the server configuration default.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    fields: Fields,
}

#[derive(Debug, Default)]
struct Collections {
    next_seq: u64,
    by_name: HashMap<String, BTreeMap<String, Stored>>,
}

impl Collections {
    fn upsert(&mut self, collection: &str, id: &str, fields: Fields) {
        let docs = self.by_name.entry(collection.to_owned()).or_default();
        if let Some(existing) = docs.get_mut(id) {
            existing.fields = fields;
        } else {
            self.next_seq += 1;
            docs.insert(
                id.to_owned(),
                Stored {
                    seq: self.next_seq,
                    fields,
                },
            );
        }
    }
}

/// Process-local document store.
#[derive(Debug)]
pub struct MemoryDocumentStore {
    collections: Mutex<Collections>,
    failing: Mutex<HashSet<String>>,
    injected_conflicts: AtomicU32,
    writes: AtomicU64,
    max_attempts: u32,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    /// Create an empty store with the default transaction attempt budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }

    /// Create an empty store with a custom transaction attempt budget.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            collections: Mutex::new(Collections::default()),
            failing: Mutex::new(HashSet::new()),
            injected_conflicts: AtomicU32::new(0),
            writes: AtomicU64::new(0),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Number of successful mutations (add, set, batch, transaction) so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of documents currently stored in `collection`.
    #[must_use]
    pub fn document_count(&self, collection: &str) -> usize {
        self.lock()
            .by_name
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Make the next `attempts` transaction attempts fail with a conflict.
    pub fn inject_conflicts(&self, attempts: u32) {
        self.injected_conflicts.store(attempts, Ordering::SeqCst);
    }

    /// Make every subsequent write to `collection` fail as unavailable.
    pub fn fail_writes_to(&self, collection: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection.to_owned());
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self, collection: &str) -> Result<(), StoreError> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if failing.contains(collection) {
            return Err(StoreError::Unavailable(format!(
                "writes to {collection} are failing"
            )));
        }
        Ok(())
    }

    fn take_injected_conflict(&self) -> bool {
        self.injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn transact_once(
        &self,
        collection: &str,
        id: &str,
        update: &UpdateFn<'_>,
    ) -> Result<Document, StoreError> {
        self.check_writable(collection)?;
        if self.take_injected_conflict() {
            return Err(StoreError::Conflict);
        }

        let mut collections = self.lock();
        let current = collections
            .by_name
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| &stored.fields);
        let next = update(current)?;
        collections.upsert(collection, id, next.clone());
        drop(collections);

        self.record_write();
        Ok(Document::new(id, next))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, StoreError>> {
        let found = self
            .lock()
            .by_name
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| Document::new(id, stored.fields.clone()));
        async move { Ok(found) }.boxed()
    }

    fn list<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Document>, StoreError>> {
        let documents = self
            .lock()
            .by_name
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, stored)| Document::new(id.clone(), stored.fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        async move { Ok(documents) }.boxed()
    }

    fn query<'a>(
        &'a self,
        collection: &'a str,
        query: &'a Query,
    ) -> BoxFuture<'a, Result<Vec<Document>, StoreError>> {
        let mut matches: Vec<(String, Stored)> = self
            .lock()
            .by_name
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, stored)| {
                        query
                            .filter()
                            .is_none_or(|(field, value)| stored.fields.get(field) == Some(value))
                    })
                    .map(|(id, stored)| (id.clone(), stored.clone()))
                    .collect()
            })
            .unwrap_or_default();

        match query.ordering() {
            Some((field, direction)) => {
                matches.sort_by(|(_, a), (_, b)| {
                    let ordering = compare_values(a.fields.get(field), b.fields.get(field))
                        .then(a.seq.cmp(&b.seq));
                    match direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                    }
                });
            }
            None => matches.sort_by_key(|(_, stored)| stored.seq),
        }

        if let Some(limit) = query.max_results() {
            matches.truncate(limit);
        }

        let documents = matches
            .into_iter()
            .map(|(id, stored)| Document::new(id, stored.fields))
            .collect();
        async move { Ok(documents) }.boxed()
    }

    fn add<'a>(
        &'a self,
        collection: &'a str,
        fields: Fields,
    ) -> BoxFuture<'a, Result<Document, StoreError>> {
        async move {
            self.check_writable(collection)?;
            let id = Uuid::new_v4().simple().to_string();
            self.lock().upsert(collection, &id, fields.clone());
            self.record_write();
            Ok(Document::new(id, fields))
        }
        .boxed()
    }

    fn set<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        fields: Fields,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            self.check_writable(collection)?;
            self.lock().upsert(collection, id, fields);
            self.record_write();
            Ok(())
        }
        .boxed()
    }

    fn set_all<'a>(
        &'a self,
        collection: &'a str,
        documents: Vec<Document>,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        async move {
            self.check_writable(collection)?;
            let mut collections = self.lock();
            for document in documents {
                collections.upsert(collection, &document.id, document.fields);
            }
            drop(collections);
            self.record_write();
            Ok(())
        }
        .boxed()
    }

    fn transact<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        update: UpdateFn<'a>,
    ) -> BoxFuture<'a, Result<Document, StoreError>> {
        async move {
            with_retries(self.max_attempts, collection, id, || {
                let outcome = self.transact_once(collection, id, &update);
                async move { outcome }
            })
            .await
        }
        .boxed()
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        async { Ok(()) }.boxed()
    }
}
