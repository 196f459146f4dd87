//! SQLite-backed document store over the `documents` table

use super::{Document, DocumentStore, FieldFilter, Scope, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;
use vitrine_common::db::schema::GLOBAL_SCOPE;

/// Document store reading JSON bodies from SQLite
#[derive(Clone)]
pub struct SqliteDocumentStore {
    db: SqlitePool,
}

fn scope_key<'a>(scope: Scope<'a>) -> &'a str {
    match scope {
        Scope::Store(store_id) => store_id,
        Scope::Global => GLOBAL_SCOPE,
    }
}

/// JSON path for a top-level field, quoted so any key is addressable
fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

fn decode(id: String, body: &str) -> Result<Document, StoreError> {
    let body: Value = serde_json::from_str(body)
        .map_err(|e| StoreError::Malformed(format!("{}: {}", id, e)))?;
    Ok(Document { id, body })
}

impl SqliteDocumentStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert or replace a document
    ///
    /// The resolver never writes documents; this exists for seeding and for
    /// the services that own the collections.
    pub async fn insert(
        &self,
        collection: &str,
        scope: Scope<'_>,
        id: &str,
        body: &Value,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_string(body)
            .map_err(|e| StoreError::Malformed(format!("{}: {}", id, e)))?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, scope, id, body, updated_at)
            VALUES (?, ?, ?, ?, strftime('%Y-%m-%d %H:%M:%f', 'now'))
            ON CONFLICT (collection, scope, id)
            DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(scope_key(scope))
        .bind(id)
        .bind(body)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(
        &self,
        collection: &str,
        scope: Scope<'_>,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT id, body FROM documents WHERE collection = ? AND scope = ? AND id = ?",
        )
        .bind(collection)
        .bind(scope_key(scope))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some((id, body)) => decode(id, &body).map(Some),
            None => Ok(None),
        }
    }

    async fn query(
        &self,
        collection: &str,
        scope: Scope<'_>,
        filters: &[FieldFilter],
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut sql = String::from("SELECT id, body FROM documents WHERE collection = ? AND scope = ?");
        for filter in filters {
            match filter.value {
                Some(_) => sql.push_str(" AND json_extract(body, ?) = ?"),
                None => sql.push_str(" AND json_extract(body, ?) IS NULL"),
            }
        }
        sql.push_str(" ORDER BY updated_at DESC, id LIMIT ?");

        let mut query = sqlx::query_as::<_, (String, String)>(&sql)
            .bind(collection)
            .bind(scope_key(scope));
        for filter in filters {
            query = query.bind(json_path(&filter.field));
            if let Some(value) = &filter.value {
                query = query.bind(value.as_str());
            }
        }
        let rows = query
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.db)
            .await?;

        // A malformed record is skipped, not the whole batch
        let mut documents = Vec::with_capacity(rows.len());
        for (id, body) in rows {
            match decode(id, &body) {
                Ok(doc) => documents.push(doc),
                Err(e) => tracing::warn!(collection, scope = %scope, error = %e, "Skipping malformed document"),
            }
        }
        Ok(documents)
    }

    async fn get_many(
        &self,
        collection: &str,
        scope: Scope<'_>,
        ids: &[String],
    ) -> Result<Vec<Document>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, body FROM documents WHERE collection = ? AND scope = ? AND id IN ({})",
            placeholders
        );

        let mut query = sqlx::query_as::<_, (String, String)>(&sql)
            .bind(collection)
            .bind(scope_key(scope));
        for id in ids {
            query = query.bind(id.as_str());
        }
        let rows = query.fetch_all(&self.db).await?;

        let mut by_id: HashMap<String, Document> = HashMap::with_capacity(rows.len());
        for (id, body) in rows {
            match decode(id, &body) {
                Ok(doc) => {
                    by_id.insert(doc.id.clone(), doc);
                }
                Err(e) => tracing::warn!(collection, scope = %scope, error = %e, "Skipping malformed document"),
            }
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
