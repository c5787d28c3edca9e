//! In-process store backend
//!
//! Used by tests and single-process deployments. `hset` applies keys one by
//! one, so a batch is not atomic with respect to concurrent readers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use shared::error::CommonError;

use super::StoreLike;

#[derive(Default)]
pub struct MemoryStore {
    namespaces: DashMap<String, DashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored in a namespace
    pub fn len(&self, namespace: &str) -> usize {
        match self.namespaces.get(namespace) {
            Some(fields) => fields.len(),
            None => 0,
        }
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

#[async_trait]
impl StoreLike for MemoryStore {
    async fn hget(&self, namespace: &str, key: &str) -> Result<Option<Value>, CommonError> {
        let Some(fields) = self.namespaces.get(namespace) else {
            return Ok(None);
        };
        let value = fields.get(key).map(|v| v.value().clone());
        Ok(value)
    }

    async fn hset(
        &self,
        namespace: &str,
        values: BTreeMap<String, Value>,
    ) -> Result<(), CommonError> {
        let fields = self.namespaces.entry(namespace.to_string()).or_default();
        for (key, value) in values {
            fields.insert(key, value);
        }
        Ok(())
    }

    async fn hmget(
        &self,
        namespace: &str,
        keys: &[String],
    ) -> Result<BTreeMap<String, Value>, CommonError> {
        let Some(fields) = self.namespaces.get(namespace) else {
            return Ok(BTreeMap::new());
        };
        let found = keys
            .iter()
            .filter_map(|key| fields.get(key).map(|v| (key.clone(), v.value().clone())))
            .collect();
        Ok(found)
    }

    async fn hgetall(&self, namespace: &str) -> Result<BTreeMap<String, Value>, CommonError> {
        let Some(fields) = self.namespaces.get(namespace) else {
            return Ok(BTreeMap::new());
        };
        let all = fields
            .iter()
            .map(|field| (field.key().clone(), field.value().clone()))
            .collect();
        Ok(all)
    }
}
