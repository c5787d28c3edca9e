//! Inbox entry data model
//!
//! One logical entry is stored twice: once in the sender's list as a
//! [`SentInboxEntry`] and once per recipient as a [`ReceivedInboxEntry`].
//! The copies share no state and are linked only by the source message
//! timestamp and the sender id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::primitives::WrappedChronoDateTime;

use super::action::InboxAction;

/// Reference to the chat message an entry is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel: String,
    /// Platform message timestamp, the natural key of an entry
    pub ts: String,
    /// Permalink to the message
    pub url: String,
}

/// Fields shared by both views of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
    pub message: MessageRef,
    pub description: String,
    pub actions: Vec<InboxAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<WrappedChronoDateTime>,
    /// Future reminder times, earliest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Vec<WrappedChronoDateTime>>,
}

impl InboxEntry {
    pub fn message_ts(&self) -> &str {
        &self.message.ts
    }

    pub fn find_action(&self, action_id: &str) -> Option<&InboxAction> {
        self.actions.iter().find(|a| a.action_id == action_id)
    }
}

/// A recipient's choice, recorded on the sender's copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxEntryResolution {
    pub action: InboxAction,
    pub timestamp: WrappedChronoDateTime,
}

/// The entry as seen by its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentInboxEntry {
    #[serde(flatten)]
    pub entry: InboxEntry,
    /// Fixed at creation, in enumeration order
    pub recipient_ids: Vec<String>,
    #[serde(default)]
    pub resolutions: BTreeMap<String, InboxEntryResolution>,
}

impl SentInboxEntry {
    pub fn new(entry: InboxEntry, recipient_ids: Vec<String>) -> Self {
        Self {
            entry,
            recipient_ids,
            resolutions: BTreeMap::new(),
        }
    }

    pub fn message_ts(&self) -> &str {
        self.entry.message_ts()
    }

    pub fn is_recipient(&self, user_id: &str) -> bool {
        self.recipient_ids.iter().any(|id| id == user_id)
    }

    /// Record a resolution, replacing any earlier one from the same recipient
    pub fn resolve(&mut self, recipient_id: &str, action: InboxAction, at: WrappedChronoDateTime) {
        self.resolutions.insert(
            recipient_id.to_string(),
            InboxEntryResolution {
                action,
                timestamp: at,
            },
        );
    }

    /// Recipients that have not acted yet, in recipient order
    pub fn pending_recipients(&self) -> impl Iterator<Item = &str> {
        self.recipient_ids
            .iter()
            .filter(|id| !self.resolutions.contains_key(id.as_str()))
            .map(String::as_str)
    }

    /// Number of resolutions per action id
    pub fn resolution_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for resolution in self.resolutions.values() {
            *counts.entry(resolution.action.action_id.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// The entry as seen by one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedInboxEntry {
    #[serde(flatten)]
    pub entry: InboxEntry,
    pub sender_id: String,
    /// Timestamps of the notifications posted to this recipient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_message_ts: Option<Vec<String>>,
}

impl ReceivedInboxEntry {
    pub fn new(entry: InboxEntry, sender_id: impl Into<String>) -> Self {
        Self {
            entry,
            sender_id: sender_id.into(),
            reminder_message_ts: None,
        }
    }

    pub fn message_ts(&self) -> &str {
        self.entry.message_ts()
    }

    pub fn push_message_ts(&mut self, ts: impl Into<String>) {
        self.reminder_message_ts
            .get_or_insert_with(Vec::new)
            .push(ts.into());
    }

    /// Remove every reminder at or before `now`, returning how many were due
    pub fn take_due_reminders(&mut self, now: WrappedChronoDateTime) -> usize {
        let Some(reminders) = self.entry.reminders.as_mut() else {
            return 0;
        };
        let before = reminders.len();
        reminders.retain(|at| *at > now);
        before - reminders.len()
    }

    pub fn has_due_reminder(&self, now: WrappedChronoDateTime) -> bool {
        self.entry
            .reminders
            .as_ref()
            .and_then(|r| r.first())
            .is_some_and(|first| *first <= now)
    }
}

/// The chat message a new entry is created from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMessage {
    pub channel: String,
    pub ts: String,
    /// Author of the message, who becomes the sender of the entry
    pub user_id: String,
}

/// Parameters for creating a new entry
#[derive(Debug, Clone)]
pub struct CreateInboxEntryParams {
    pub message: SourceMessage,
    pub description: String,
    pub actions: Vec<InboxAction>,
    pub deadline: Option<WrappedChronoDateTime>,
    pub notify_on_create: bool,
    pub enable_reminders: bool,
}

/// Outcome of a successful creation
#[derive(Debug, Clone)]
pub struct CreateInboxEntryResponse {
    pub entry: SentInboxEntry,
    /// Recipients that received a "new entry" notification
    pub notified: usize,
    /// Whether notification fan-out stopped early because of rate limiting
    pub rate_limited: bool,
}
