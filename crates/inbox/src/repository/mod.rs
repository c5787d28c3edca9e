//! Repository layer for inbox crate
//!
//! Persistence is a hash-style key-value store: each namespace maps a user id
//! to one JSON document. [`StoreLike`] is the backend contract;
//! [`InboxRepository`] layers the typed sent/received lists on top of it.

pub mod memory;
pub mod sqlite;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::CommonError;
use tracing::trace;

pub use memory::MemoryStore;
pub use sqlite::Repository;

use crate::logic::entry::{ReceivedInboxEntry, SentInboxEntry};

pub const SENT_NAMESPACE: &str = "inbox:sent";
pub const RECEIVED_NAMESPACE: &str = "inbox:received";

// --- Store Trait ---

/// Hash-map persistence keyed by namespace and secondary key
#[async_trait]
pub trait StoreLike: Send + Sync {
    /// Read one field
    async fn hget(&self, namespace: &str, key: &str) -> Result<Option<Value>, CommonError>;

    /// Write several fields, replacing existing values
    async fn hset(
        &self,
        namespace: &str,
        values: BTreeMap<String, Value>,
    ) -> Result<(), CommonError>;

    /// Read several fields in one call. Missing keys are omitted.
    async fn hmget(
        &self,
        namespace: &str,
        keys: &[String],
    ) -> Result<BTreeMap<String, Value>, CommonError>;

    /// Read every field of a namespace
    async fn hgetall(&self, namespace: &str) -> Result<BTreeMap<String, Value>, CommonError>;
}

// --- Typed Inbox Repository ---

fn decode_list<T: DeserializeOwned>(
    namespace: &str,
    key: &str,
    value: Value,
) -> Result<Vec<T>, CommonError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| CommonError::Repository {
        msg: format!("Failed to decode {namespace} entries for {key}: {e}"),
        source: Some(e.into()),
    })
}

fn encode_list<T: Serialize>(entries: &[T]) -> Result<Value, CommonError> {
    Ok(serde_json::to_value(entries)?)
}

/// Sent and received entry lists per user
///
/// Every write replaces a user's whole list. Two writers touching the same
/// user concurrently can lose one update; there is no version check.
#[derive(Clone)]
pub struct InboxRepository {
    store: Arc<dyn StoreLike>,
    sent_namespace: String,
    received_namespace: String,
}

impl InboxRepository {
    /// `prefix` separates environments sharing one backend
    pub fn new(store: Arc<dyn StoreLike>, prefix: Option<&str>) -> Self {
        let namespaced = |ns: &str| match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => format!("{prefix}:{ns}"),
            None => ns.to_string(),
        };

        Self {
            store,
            sent_namespace: namespaced(SENT_NAMESPACE),
            received_namespace: namespaced(RECEIVED_NAMESPACE),
        }
    }

    pub fn sent_namespace(&self) -> &str {
        &self.sent_namespace
    }

    pub fn received_namespace(&self) -> &str {
        &self.received_namespace
    }

    pub async fn get_sent(&self, user_id: &str) -> Result<Vec<SentInboxEntry>, CommonError> {
        match self.store.hget(&self.sent_namespace, user_id).await? {
            Some(value) => decode_list(&self.sent_namespace, user_id, value),
            None => Ok(Vec::new()),
        }
    }

    pub async fn set_sent(
        &self,
        user_id: &str,
        entries: &[SentInboxEntry],
    ) -> Result<(), CommonError> {
        trace!(user_id = %user_id, count = entries.len(), "Writing sent entries");
        let mut values = BTreeMap::new();
        values.insert(user_id.to_string(), encode_list(entries)?);
        self.store.hset(&self.sent_namespace, values).await
    }

    pub async fn get_received(
        &self,
        user_id: &str,
    ) -> Result<Vec<ReceivedInboxEntry>, CommonError> {
        match self.store.hget(&self.received_namespace, user_id).await? {
            Some(value) => decode_list(&self.received_namespace, user_id, value),
            None => Ok(Vec::new()),
        }
    }

    /// Received lists of several users in one read; absent users map to an empty list
    pub async fn get_received_many(
        &self,
        user_ids: &[String],
    ) -> Result<BTreeMap<String, Vec<ReceivedInboxEntry>>, CommonError> {
        let mut found = self.store.hmget(&self.received_namespace, user_ids).await?;
        let mut inboxes = BTreeMap::new();
        for user_id in user_ids {
            let entries = match found.remove(user_id) {
                Some(value) => decode_list(&self.received_namespace, user_id, value)?,
                None => Vec::new(),
            };
            inboxes.entry(user_id.clone()).or_insert(entries);
        }
        Ok(inboxes)
    }

    /// Write several received lists in one batch
    pub async fn set_received_many(
        &self,
        inboxes: BTreeMap<String, Vec<ReceivedInboxEntry>>,
    ) -> Result<(), CommonError> {
        if inboxes.is_empty() {
            return Ok(());
        }
        let mut values = BTreeMap::new();
        for (user_id, entries) in inboxes {
            values.insert(user_id, encode_list(&entries)?);
        }
        trace!(users = values.len(), "Writing received entries");
        self.store.hset(&self.received_namespace, values).await
    }

    /// Every stored received list
    pub async fn get_all_received(
        &self,
    ) -> Result<BTreeMap<String, Vec<ReceivedInboxEntry>>, CommonError> {
        let all = self.store.hgetall(&self.received_namespace).await?;
        all.into_iter()
            .map(|(user_id, value)| {
                let entries = decode_list(&self.received_namespace, &user_id, value)?;
                Ok((user_id, entries))
            })
            .collect()
    }

    /// Batched read-modify-write over the received lists of `recipient_ids`.
    ///
    /// One read for all recipients, `update` applied once per distinct
    /// recipient, one batched write. The batch is as atomic as the backend's
    /// `hset`: all-or-nothing for [`Repository`], per key for [`MemoryStore`].
    pub async fn update_all_received_inboxes<F>(
        &self,
        recipient_ids: &[String],
        mut update: F,
    ) -> Result<(), CommonError>
    where
        F: FnMut(Vec<ReceivedInboxEntry>, &str) -> Vec<ReceivedInboxEntry> + Send,
    {
        if recipient_ids.is_empty() {
            return Ok(());
        }

        let current = self.get_received_many(recipient_ids).await?;
        let updated = current
            .into_iter()
            .map(|(recipient_id, inbox)| {
                let inbox = update(inbox, &recipient_id);
                (recipient_id, inbox)
            })
            .collect();

        self.set_received_many(updated).await
    }
}
