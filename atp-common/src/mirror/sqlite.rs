//! SQLite-backed document store
//!
//! Each collection is a table named `<database>__<collection>` holding a
//! generated `_id` and the JSON body. Indexes are expression indexes over
//! `json_extract(body, '$.<field>')`, so a unique index enforces the same
//! constraint a document database would.

use super::backend::{DocumentStore, UpsertKind};
use super::document::{CollectionSpec, Document, DocumentKey};
use super::MirrorError;
use crate::config::MirrorSettings;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

pub struct SqliteDocumentStore {
    pool: SqlitePool,
    database: String,
}

impl SqliteDocumentStore {
    /// Open the store described by `settings`
    pub async fn connect(settings: &MirrorSettings) -> Result<Self, MirrorError> {
        validate_name(&settings.database)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&settings.uri)
            .await
            .map_err(|e| MirrorError::Unavailable(format!("Failed to connect: {}", e)))?;

        Ok(Self::with_pool(pool, &settings.database))
    }

    /// Wrap an existing pool (tests use an in-memory database)
    pub fn with_pool(pool: SqlitePool, database: &str) -> Self {
        Self {
            pool,
            database: database.to_string(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn table_name(&self, collection: &str) -> Result<String, MirrorError> {
        validate_name(&self.database)?;
        validate_name(collection)?;
        Ok(format!("{}__{}", self.database, collection))
    }

    async fn ensure_table<'e, E>(executor: E, table: &str) -> Result<(), MirrorError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{table}" (
                _id TEXT PRIMARY KEY,
                body TEXT NOT NULL CHECK (json_valid(body)),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        );
        sqlx::query(&sql).execute(executor).await?;
        Ok(())
    }
}

/// Names become part of SQL identifiers and JSON paths, so only
/// ASCII letters, digits and underscores are accepted.
fn validate_name(name: &str) -> Result<(), MirrorError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(MirrorError::InvalidName(name.to_string()))
    }
}

fn field_expr(field: &str) -> Result<String, MirrorError> {
    validate_name(field)?;
    Ok(format!("json_extract(body, '$.{}')", field))
}

fn where_clause(key: &DocumentKey) -> Result<String, MirrorError> {
    if key.fields().is_empty() {
        return Ok("1 = 1".to_string());
    }
    let parts = key
        .fields()
        .iter()
        .map(|(field, _)| field_expr(field).map(|expr| format!("{} = ?", expr)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(" AND "))
}

fn decode_body(id: String, body: &str) -> Result<Document, MirrorError> {
    let mut doc: Document = serde_json::from_str(body)?;
    doc.insert("_id".into(), Value::String(id));
    Ok(doc)
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> Result<(), MirrorError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| MirrorError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), MirrorError> {
        let table = self.table_name(spec.name)?;
        Self::ensure_table(&self.pool, &table).await?;

        for index in &spec.indexes {
            let exprs = index
                .fields
                .iter()
                .map(|f| field_expr(f))
                .collect::<Result<Vec<_>, _>>()?;
            let index_name = format!("{}__{}", table, index.fields.join("_"));
            let sql = format!(
                r#"CREATE {unique}INDEX IF NOT EXISTS "{index_name}" ON "{table}" ({exprs})"#,
                unique = if index.unique { "UNIQUE " } else { "" },
                exprs = exprs.join(", "),
            );
            sqlx::query(&sql).execute(&self.pool).await?;
            debug!(table = %table, index = %index_name, unique = index.unique, "Index ensured");
        }

        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        key: &DocumentKey,
        document: &Document,
    ) -> Result<UpsertKind, MirrorError> {
        let table = self.table_name(collection)?;
        let mut tx = self.pool.begin().await?;
        Self::ensure_table(&mut *tx, &table).await?;

        let select = format!(
            r#"SELECT _id, body FROM "{}" WHERE {} LIMIT 1"#,
            table,
            where_clause(key)?
        );
        let mut query = sqlx::query_as::<_, (String, String)>(&select);
        for (_, value) in key.fields() {
            query = query.bind(value);
        }
        let existing = query.fetch_optional(&mut *tx).await?;

        let kind = match existing {
            Some((id, body)) => {
                let mut merged: Document = serde_json::from_str(&body)?;
                for (field, value) in document {
                    merged.insert(field.clone(), value.clone());
                }
                let update = format!(
                    r#"UPDATE "{}" SET body = ?, updated_at = CURRENT_TIMESTAMP WHERE _id = ?"#,
                    table
                );
                sqlx::query(&update)
                    .bind(serde_json::to_string(&merged)?)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await?;
                UpsertKind::Updated
            }
            None => {
                let insert = format!(r#"INSERT INTO "{}" (_id, body) VALUES (?, ?)"#, table);
                sqlx::query(&insert)
                    .bind(Uuid::new_v4().to_string())
                    .bind(serde_json::to_string(document)?)
                    .execute(&mut *tx)
                    .await?;
                UpsertKind::Inserted
            }
        };

        tx.commit().await?;
        Ok(kind)
    }

    async fn find_one(
        &self,
        collection: &str,
        key: &DocumentKey,
    ) -> Result<Option<Document>, MirrorError> {
        let table = self.table_name(collection)?;
        Self::ensure_table(&self.pool, &table).await?;

        let select = format!(
            r#"SELECT _id, body FROM "{}" WHERE {} LIMIT 1"#,
            table,
            where_clause(key)?
        );
        let mut query = sqlx::query_as::<_, (String, String)>(&select);
        for (_, value) in key.fields() {
            query = query.bind(value);
        }

        match query.fetch_optional(&self.pool).await? {
            Some((id, body)) => Ok(Some(decode_body(id, &body)?)),
            None => Ok(None),
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
