//! SQLite (libsql) store backend
//!
//! One row per `(namespace, key)`; values are JSON text. A `hset` batch is
//! written inside a single transaction, so it either lands completely or not
//! at all.

use std::collections::BTreeMap;

use async_trait::async_trait;
use libsql::params::Params;
use serde_json::Value;
use shared::{
    error::CommonError,
    libsql::{Migrations, establish_db_connection},
    primitives::WrappedChronoDateTime,
};
use tracing::trace;
use url::Url;

use super::StoreLike;

/// SQLite parameter lists are capped; keep `IN (...)` lists well below that.
const HMGET_CHUNK_SIZE: usize = 500;

/// libsql-backed hash store
#[derive(Clone)]
pub struct Repository {
    conn: shared::libsql::Connection,
}

impl Repository {
    /// Create a new repository instance over an already migrated connection
    pub fn new(conn: shared::libsql::Connection) -> Self {
        Self { conn }
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &shared::libsql::Connection {
        &self.conn
    }

    pub fn load_sql_migrations() -> Migrations<'static> {
        let mut migrations = Migrations::new();
        migrations.insert(
            "20240301000000_inbox_kv.up.sql",
            include_str!("../../../dbs/migrations/20240301000000_inbox_kv.up.sql"),
        );
        migrations.insert(
            "20240301000000_inbox_kv.down.sql",
            include_str!("../../../dbs/migrations/20240301000000_inbox_kv.down.sql"),
        );
        migrations
    }

    /// Open the database at `url` and apply migrations
    pub async fn connect(url: &Url) -> Result<(libsql::Database, Self), CommonError> {
        let (db, conn) = establish_db_connection(url, Some(Self::load_sql_migrations())).await?;
        Ok((db, Self::new(conn)))
    }
}

fn decode_value(namespace: &str, key: &str, raw: &str) -> Result<Value, CommonError> {
    serde_json::from_str(raw).map_err(|e| CommonError::Repository {
        msg: format!("Stored value for {namespace}/{key} is not valid JSON: {e}"),
        source: Some(e.into()),
    })
}

#[async_trait]
impl StoreLike for Repository {
    async fn hget(&self, namespace: &str, key: &str) -> Result<Option<Value>, CommonError> {
        trace!(namespace = %namespace, key = %key, "hget");
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM inbox_kv WHERE namespace = ?1 AND key = ?2",
                libsql::params![namespace.to_string(), key.to_string()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(Some(decode_value(namespace, key, &raw)?))
            }
            None => Ok(None),
        }
    }

    async fn hset(
        &self,
        namespace: &str,
        values: BTreeMap<String, Value>,
    ) -> Result<(), CommonError> {
        if values.is_empty() {
            return Ok(());
        }
        trace!(namespace = %namespace, count = values.len(), "hset");

        let updated_at = WrappedChronoDateTime::now().to_string();
        let tx = self.conn.transaction().await?;
        for (key, value) in values {
            let raw = serde_json::to_string(&value)?;
            tx.execute(
                "INSERT INTO inbox_kv (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                libsql::params![namespace.to_string(), key, raw, updated_at.clone()],
            )
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn hmget(
        &self,
        namespace: &str,
        keys: &[String],
    ) -> Result<BTreeMap<String, Value>, CommonError> {
        trace!(namespace = %namespace, count = keys.len(), "hmget");
        let mut found = BTreeMap::new();

        for chunk in keys.chunks(HMGET_CHUNK_SIZE) {
            let placeholders = (0..chunk.len())
                .map(|i| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT key, value FROM inbox_kv WHERE namespace = ?1 AND key IN ({placeholders})"
            );

            let mut params = Vec::with_capacity(chunk.len() + 1);
            params.push(libsql::Value::Text(namespace.to_string()));
            params.extend(chunk.iter().map(|k| libsql::Value::Text(k.clone())));

            let mut rows = self.conn.query(&sql, Params::Positional(params)).await?;
            while let Some(row) = rows.next().await? {
                let key: String = row.get(0)?;
                let raw: String = row.get(1)?;
                let value = decode_value(namespace, &key, &raw)?;
                found.insert(key, value);
            }
        }

        Ok(found)
    }

    async fn hgetall(&self, namespace: &str) -> Result<BTreeMap<String, Value>, CommonError> {
        trace!(namespace = %namespace, "hgetall");
        let mut rows = self
            .conn
            .query(
                "SELECT key, value FROM inbox_kv WHERE namespace = ?1",
                libsql::params![namespace.to_string()],
            )
            .await?;

        let mut all = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            let key: String = row.get(0)?;
            let raw: String = row.get(1)?;
            let value = decode_value(namespace, &key, &raw)?;
            all.insert(key, value);
        }
        Ok(all)
    }
}
