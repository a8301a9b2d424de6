//! PostgreSQL-backed document store.
//!
//! Each document is a row of the `documents` table keyed by
//! `(collection, id)` with its body in a JSONB column. Queries are pushed down
//! to SQL; server timestamps come from the database clock.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    Batch, CollectionPath, Direction, Document, DocumentPath, DocumentStore, FieldMap, Fields,
    Query, StoreError, new_document_id,
};

/// [`DocumentStore`] over a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a store over an existing pool.
    ///
    /// The `documents` table must exist (see `db::run_migrations`).
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve server timestamp sentinels against the database clock.
    async fn resolve(&self, fields: Fields) -> Result<FieldMap, StoreError> {
        if !fields.needs_server_time() {
            return Ok(fields.resolve(Utc::now()));
        }
        let now: DateTime<Utc> = sqlx::query_scalar("SELECT clock_timestamp()")
            .fetch_one(&self.pool)
            .await?;
        Ok(fields.resolve(now))
    }
}

#[async_trait::async_trait]
impl DocumentStore for PgDocumentStore {
    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT id, fields FROM documents WHERE collection = ");
        builder.push_bind(collection.as_str().to_owned());

        if let Some((field, value)) = query.filter() {
            builder.push(" AND fields -> ");
            builder.push_bind(field.to_owned());
            builder.push(" = ");
            builder.push_bind(Json(value.clone()));
        }

        if let Some((field, direction)) = query.ordering() {
            builder.push(" AND fields ? ");
            builder.push_bind(field.to_owned());
            builder.push(" ORDER BY fields -> ");
            builder.push_bind(field.to_owned());
            builder.push(match direction {
                Direction::Ascending => " ASC",
                Direction::Descending => " DESC",
            });
        } else {
            builder.push(" ORDER BY id");
        }

        if let Some(n) = query.max_results() {
            builder.push(" LIMIT ");
            builder.push_bind(i64::try_from(n).unwrap_or(i64::MAX));
        }

        let rows: Vec<(String, Json<FieldMap>)> =
            builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(fields))| Document { id, fields })
            .collect())
    }

    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let row: Option<(Json<FieldMap>,)> =
            sqlx::query_as("SELECT fields FROM documents WHERE collection = $1 AND id = $2")
                .bind(path.collection().as_str())
                .bind(path.id())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(fields),)| Document {
            id: path.id().to_owned(),
            fields,
        }))
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let body = self.resolve(fields).await?;
        sqlx::query(
            r"
            INSERT INTO documents (collection, id, fields)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET fields = EXCLUDED.fields, updated_at = clock_timestamp()
            ",
        )
        .bind(path.collection().as_str())
        .bind(path.id())
        .bind(Json(body))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        let body = self.resolve(fields).await?;
        let result = sqlx::query(
            r"
            UPDATE documents
            SET fields = fields || $3, updated_at = clock_timestamp()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(path.collection().as_str())
        .bind(path.id())
        .bind(Json(body))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        let id = new_document_id();
        self.set(&collection.doc(&id), fields).await?;
        Ok(id)
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(path.collection().as_str())
            .bind(path.id())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn commit(&self, batch: Batch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for path in batch.deletes() {
            sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                .bind(path.collection().as_str())
                .bind(path.id())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
