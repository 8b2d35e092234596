//! `PostgreSQL` implementation of the document store.
//!
//! All collections share the `documents` table (see `migrations/`). Document
//! fields live in a JSONB column; filters and orderings use the `->` operator,
//! which compares JSON numbers numerically and JSON strings lexically.
//!
//! Queries spell collection and field names as SQL literals rather than bind
//! parameters, so the planner can match expression and partial indexes such
//! as `documents_orders_by_user_idx`.

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    Direction, Document, DocumentStore, Fields, Query, StoreError, UpdateFn, with_retries,
};

/// Embedded migrations for the document store schema.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLSTATE codes that mean "another transaction got there first, try again".
const RETRYABLE_SQLSTATES: &[&str] = &[
    "23505", // unique_violation: concurrent creation of the same document
    "40001", // serialization_failure
    "40P01", // deadlock_detected
];

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Document store backed by the `documents` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    max_attempts: u32,
}

impl PgDocumentStore {
    /// Create a store over an existing pool.
    ///
    /// `max_attempts` bounds how often a conflicting transaction is retried
    /// (at least one attempt is always made).
    #[must_use]
    pub fn new(pool: PgPool, max_attempts: u32) -> Self {
        Self {
            pool,
            max_attempts: max_attempts.max(1),
        }
    }

    async fn transact_once(
        &self,
        collection: &str,
        id: &str,
        update: &UpdateFn<'_>,
    ) -> Result<Document, StoreError> {
        let mut tx = self.pool.begin().await.map_err(classify)?;

        // Row lock: concurrent transactions on this document queue up here and
        // read the committed value once the holder finishes.
        let current: Option<Json<Fields>> = sqlx::query_scalar(
            r"
            SELECT data
            FROM documents
            WHERE collection = $1 AND id = $2
            FOR UPDATE
            ",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(classify)?;

        let current = current.map(|Json(fields)| fields);
        let next = update(current.as_ref())?;

        if current.is_some() {
            sqlx::query(
                r"
                UPDATE documents
                SET data = $3, updated_at = now()
                WHERE collection = $1 AND id = $2
                ",
            )
            .bind(collection)
            .bind(id)
            .bind(Json(&next))
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        } else {
            // No ON CONFLICT: if another transaction created the document
            // first, the unique violation sends us back around with its value.
            sqlx::query(
                r"
                INSERT INTO documents (collection, id, data)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(collection)
            .bind(id)
            .bind(Json(&next))
            .execute(&mut *tx)
            .await
            .map_err(classify)?;
        }

        tx.commit().await.map_err(classify)?;

        Ok(Document::new(id, next))
    }
}

/// Map retryable database errors to `StoreError::Conflict`.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err
            .code()
            .is_some_and(|code| RETRYABLE_SQLSTATES.contains(&code.as_ref()))
    {
        return StoreError::Conflict;
    }
    StoreError::Database(err)
}

/// Render a collection or field name as a SQL string literal.
///
/// Only ASCII letters, digits and `_` are accepted, so the literal never needs
/// escaping.
fn sql_name(name: &str) -> Result<String, StoreError> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(StoreError::InvalidQuery(format!("unsupported name {name:?}")));
    }
    Ok(format!("'{name}'"))
}

/// Build the `SELECT` for a filtered, ordered, limited collection query.
fn select_sql<'q>(collection: &str, query: &Query) -> Result<QueryBuilder<'q, Postgres>, StoreError> {
    let mut builder = QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
    builder.push(sql_name(collection)?);

    if let Some((field, value)) = query.filter() {
        builder.push(" AND data -> ");
        builder.push(sql_name(field)?);
        builder.push(" = ");
        builder.push_bind(Json(value.clone()));
    }

    match query.ordering() {
        Some((field, direction)) => {
            let dir = match direction {
                Direction::Ascending => "ASC",
                Direction::Descending => "DESC",
            };
            builder.push(" ORDER BY data -> ");
            builder.push(sql_name(field)?);
            builder.push(format!(" {dir}, seq {dir}"));
        }
        None => {
            builder.push(" ORDER BY seq ASC");
        }
    }

    if let Some(limit) = query.max_results() {
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    Ok(builder)
}

fn into_documents(rows: Vec<(String, Json<Fields>)>) -> Vec<Document> {
    rows.into_iter()
        .map(|(id, Json(fields))| Document::new(id, fields))
        .collect()
}

impl DocumentStore for PgDocumentStore {
    fn get<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>, StoreError>> {
        async move {
            let row: Option<(String, Json<Fields>)> = sqlx::query_as(
                r"
                SELECT id, data
                FROM documents
                WHERE collection = $1 AND id = $2
                ",
            )
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(|(id, Json(fields))| Document::new(id, fields)))
        }
        .boxed()
    }

    fn list<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Document>, StoreError>> {
        async move {
            let rows: Vec<(String, Json<Fields>)> = sqlx::query_as(
                r"
                SELECT id, data
                FROM documents
                WHERE collection = $1
                ORDER BY id
                ",
            )
            .bind(collection)
            .fetch_all(&self.pool)
            .await?;

            Ok(into_documents(rows))
        }
        .boxed()
    }

    fn query<'a>(
        &'a self,
        collection: &'a str,
        query: &'a Query,
    ) -> BoxFuture<'a, Result<Vec<Document>, StoreError>> {
        async move {
            let mut builder = select_sql(collection, query)?;

            let rows: Vec<(String, Json<Fields>)> = builder
                .build_query_as()
                .fetch_all(&self.pool)
                .await?;

            Ok(into_documents(rows))
        }
        .boxed()
    }

    fn add<'a>(
        &'a self,
        collection: &'a str,
        fields: Fields,
    ) -> BoxFuture<'a, Result<Document, StoreError>> {
        async move {
            let id = Uuid::new_v4().simple().to_string();

            sqlx::query(
                r"
                INSERT INTO documents (collection, id, data)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(collection)
            .bind(&id)
            .bind(Json(&fields))
            .execute(&self.pool)
            .await?;

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
            upsert(&self.pool, collection, id, &fields).await?;
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
            let mut tx = self.pool.begin().await?;
            for document in &documents {
                upsert(&mut *tx, collection, &document.id, &document.fields).await?;
            }
            tx.commit().await?;
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
                self.transact_once(collection, id, &update)
            })
            .await
        }
        .boxed()
    }

    fn ping(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        }
        .boxed()
    }
}

async fn upsert<'e, E>(executor: E, collection: &str, id: &str, fields: &Fields) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r"
        INSERT INTO documents (collection, id, data)
        VALUES ($1, $2, $3)
        ON CONFLICT (collection, id)
        DO UPDATE SET data = EXCLUDED.data, updated_at = now()
        ",
    )
    .bind(collection)
    .bind(id)
    .bind(Json(fields))
    .execute(executor)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_name_quotes_plain_names() {
        assert_eq!(sql_name("orders").unwrap(), "'orders'");
        assert_eq!(sql_name("userId").unwrap(), "'userId'");
        assert_eq!(sql_name("created_at_2").unwrap(), "'created_at_2'");
    }

    #[test]
    fn test_sql_name_rejects_anything_needing_escapes() {
        for name in ["", "user'Id", "a b", "data->x", "x;DROP TABLE documents", "naïve"] {
            assert!(matches!(sql_name(name), Err(StoreError::InvalidQuery(_))), "{name}");
        }
    }

    #[test]
    fn test_order_history_sql_uses_indexed_expressions() {
        let query = Query::new()
            .where_eq("userId", "u1")
            .order_by("createdAt", Direction::Descending)
            .limit(20);

        let builder = select_sql("orders", &query).unwrap();

        // Same expressions as documents_orders_by_user_idx
        assert_eq!(
            builder.sql(),
            "SELECT id, data FROM documents WHERE collection = 'orders' \
             AND data -> 'userId' = $1 \
             ORDER BY data -> 'createdAt' DESC, seq DESC LIMIT $2"
        );
    }

    #[test]
    fn test_unordered_query_falls_back_to_insertion_order() {
        let builder = select_sql("menu", &Query::new()).unwrap();
        assert_eq!(
            builder.sql(),
            "SELECT id, data FROM documents WHERE collection = 'menu' ORDER BY seq ASC"
        );
    }

    #[test]
    fn test_query_rejects_unaddressable_field() {
        let query = Query::new().where_eq("user'Id", "u1");
        assert!(matches!(
            select_sql("orders", &query),
            Err(StoreError::InvalidQuery(_))
        ));
    }
}
