//! Test doubles for the chat platform and the store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use shared::error::CommonError;

use crate::logic::entry::ReceivedInboxEntry;
use crate::logic::platform::{
    DeliveryError, EphemeralSenderLike, MemberListerLike, MemberPage, MessageHandle,
    NotificationKind, NotificationSenderLike, PermalinkResolverLike,
};
use crate::repository::{InboxRepository, MemoryStore, StoreLike};

/// A delivered notification as seen by the fake platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipient_id: String,
    pub message_ts: String,
    pub kind: NotificationKind,
    pub handle_ts: String,
}

/// In-memory chat platform with scripted failures
#[derive(Default)]
pub struct FakePlatform {
    /// Channel id -> pages of members
    pub channels: HashMap<String, Vec<Vec<String>>>,
    /// Recipients whose delivery reports rate limiting
    pub rate_limited: HashSet<String>,
    /// Recipients whose delivery fails for another reason
    pub failing: HashSet<String>,
    pub fail_permalink: bool,
    pub notification_delay: Option<Duration>,
    /// Delay before each member page is returned
    pub page_delay: Option<Duration>,
    /// Received entry (recipient, sender, message ts) removed from the store
    /// while the first notification is in flight
    pub dismiss_on_send: Option<(InboxRepository, String, String, String)>,
    pub attempts: Mutex<Vec<String>>,
    pub notifications: Mutex<Vec<SentNotification>>,
    pub ephemerals: Mutex<Vec<(String, String, String)>>,
    counter: AtomicUsize,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel whose members are served in the given pages
    pub fn with_channel(mut self, channel_id: &str, pages: &[&[&str]]) -> Self {
        self.channels.insert(
            channel_id.to_string(),
            pages
                .iter()
                .map(|page| page.iter().map(|m| m.to_string()).collect())
                .collect(),
        );
        self
    }

    pub fn rate_limit(mut self, recipient_id: &str) -> Self {
        self.rate_limited.insert(recipient_id.to_string());
        self
    }

    pub fn fail_for(mut self, recipient_id: &str) -> Self {
        self.failing.insert(recipient_id.to_string());
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = Some(delay);
        self
    }

    pub fn dismiss_during_send(
        mut self,
        repository: InboxRepository,
        recipient_id: &str,
        sender_id: &str,
        message_ts: &str,
    ) -> Self {
        self.dismiss_on_send = Some((
            repository,
            recipient_id.to_string(),
            sender_id.to_string(),
            message_ts.to_string(),
        ));
        self
    }

    pub fn attempted(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.notifications.lock().unwrap().clone()
    }
}

pub fn permalink_for(channel_id: &str, message_ts: &str) -> String {
    format!(
        "https://example.slack.com/archives/{channel_id}/p{}",
        message_ts.replace('.', "")
    )
}

#[async_trait]
impl MemberListerLike for FakePlatform {
    async fn list_members(
        &self,
        channel_id: &str,
        cursor: Option<&str>,
    ) -> Result<MemberPage, CommonError> {
        if let Some(delay) = self.page_delay {
            tokio::time::sleep(delay).await;
        }
        let pages = self.channels.get(channel_id).cloned().unwrap_or_default();
        let index = match cursor {
            None => 0,
            Some(c) => c
                .trim_start_matches("page-")
                .parse::<usize>()
                .map_err(|e| CommonError::InvalidRequest {
                    msg: format!("bad cursor {c}"),
                    source: Some(e.into()),
                })?,
        };

        let members = pages.get(index).cloned().unwrap_or_default();
        let next_cursor = if index + 1 < pages.len() {
            Some(format!("page-{}", index + 1))
        } else {
            Some(String::new())
        };
        Ok(MemberPage {
            members,
            next_cursor,
        })
    }
}

#[async_trait]
impl PermalinkResolverLike for FakePlatform {
    async fn get_permalink(
        &self,
        channel_id: &str,
        message_ts: &str,
    ) -> Result<String, CommonError> {
        if self.fail_permalink {
            return Err(CommonError::InvalidResponse {
                msg: "message_not_found".to_string(),
                source: None,
            });
        }
        Ok(permalink_for(channel_id, message_ts))
    }
}

#[async_trait]
impl NotificationSenderLike for FakePlatform {
    async fn send_notification(
        &self,
        recipient_id: &str,
        entry: &ReceivedInboxEntry,
        kind: NotificationKind,
    ) -> Result<MessageHandle, DeliveryError> {
        self.attempts.lock().unwrap().push(recipient_id.to_string());

        if let Some(delay) = self.notification_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((repository, recipient, sender, ts)) = &self.dismiss_on_send {
            if self.counter.load(Ordering::SeqCst) == 0 {
                crate::logic::resolve::dismiss_received(repository, recipient, sender, ts)
                    .await
                    .map_err(|e| DeliveryError::Other(e.to_string()))?;
            }
        }
        if self.rate_limited.contains(recipient_id) {
            return Err(DeliveryError::RateLimited);
        }
        if self.failing.contains(recipient_id) {
            return Err(DeliveryError::Other("channel_not_found".to_string()));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = MessageHandle {
            channel: format!("D-{recipient_id}"),
            ts: format!("{n}.000100"),
        };
        self.notifications.lock().unwrap().push(SentNotification {
            recipient_id: recipient_id.to_string(),
            message_ts: entry.message_ts().to_string(),
            kind,
            handle_ts: handle.ts.clone(),
        });
        Ok(handle)
    }
}

#[async_trait]
impl EphemeralSenderLike for FakePlatform {
    async fn send_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<(), CommonError> {
        self.ephemerals.lock().unwrap().push((
            channel_id.to_string(),
            user_id.to_string(),
            text.to_string(),
        ));
        Ok(())
    }
}

/// Memory store that records every `hset` batch
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    pub writes: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys written to `namespace`, one element per written key
    pub fn written_keys(&self, namespace: &str) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(ns, _)| ns == namespace)
            .flat_map(|(_, keys)| keys.clone())
            .collect()
    }
}

#[async_trait]
impl StoreLike for RecordingStore {
    async fn hget(&self, namespace: &str, key: &str) -> Result<Option<Value>, CommonError> {
        self.inner.hget(namespace, key).await
    }

    async fn hset(
        &self,
        namespace: &str,
        values: BTreeMap<String, Value>,
    ) -> Result<(), CommonError> {
        self.writes
            .lock()
            .unwrap()
            .push((namespace.to_string(), values.keys().cloned().collect()));
        self.inner.hset(namespace, values).await
    }

    async fn hmget(
        &self,
        namespace: &str,
        keys: &[String],
    ) -> Result<BTreeMap<String, Value>, CommonError> {
        self.inner.hmget(namespace, keys).await
    }

    async fn hgetall(&self, namespace: &str) -> Result<BTreeMap<String, Value>, CommonError> {
        self.inner.hgetall(namespace).await
    }
}
