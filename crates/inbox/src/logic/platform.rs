//! Chat platform capabilities the inbox depends on
//!
//! The engine never talks to a concrete chat API. Each capability is a small
//! async trait; [`ChatPlatformLike`] bundles all of them for callers that
//! hand a single platform object to the service.

use async_trait::async_trait;
use shared::error::CommonError;

use super::entry::ReceivedInboxEntry;

/// One page of channel members
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPage {
    pub members: Vec<String>,
    /// Cursor for the next page; `None` or empty means no more pages
    pub next_cursor: Option<String>,
}

impl MemberPage {
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Address of a posted message, used to edit it later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle {
    pub channel: String,
    pub ts: String,
}

/// Why a notification could not be delivered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("rate limited by the chat platform")]
    RateLimited,
    #[error("delivery failed: {0}")]
    Other(String),
}

/// The reason a notification is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    New,
    Reminder,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::New => write!(f, "new"),
            NotificationKind::Reminder => write!(f, "reminder"),
        }
    }
}

#[async_trait]
pub trait MemberListerLike: Send + Sync {
    /// List one page of members of a channel
    async fn list_members(
        &self,
        channel_id: &str,
        cursor: Option<&str>,
    ) -> Result<MemberPage, CommonError>;
}

#[async_trait]
pub trait PermalinkResolverLike: Send + Sync {
    /// Stable link to a posted message
    async fn get_permalink(&self, channel_id: &str, message_ts: &str)
    -> Result<String, CommonError>;
}

#[async_trait]
pub trait NotificationSenderLike: Send + Sync {
    /// Render and deliver one notification about `entry` to `recipient_id`
    async fn send_notification(
        &self,
        recipient_id: &str,
        entry: &ReceivedInboxEntry,
        kind: NotificationKind,
    ) -> Result<MessageHandle, DeliveryError>;
}

#[async_trait]
pub trait EphemeralSenderLike: Send + Sync {
    /// Post a message only `user_id` can see
    async fn send_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<(), CommonError>;
}

/// Everything the inbox needs from the chat platform
pub trait ChatPlatformLike:
    MemberListerLike + PermalinkResolverLike + NotificationSenderLike + EphemeralSenderLike
{
}

impl<T> ChatPlatformLike for T where
    T: MemberListerLike + PermalinkResolverLike + NotificationSenderLike + EphemeralSenderLike
{
}

/// Collect every member of a channel, following the cursor until the last page
pub async fn list_all_members<L>(lister: &L, channel_id: &str) -> Result<Vec<String>, CommonError>
where
    L: MemberListerLike + ?Sized,
{
    let mut members = Vec::new();
    if channel_id.is_empty() {
        return Ok(members);
    }

    let mut cursor: Option<String> = None;
    loop {
        let page = lister.list_members(channel_id, cursor.as_deref()).await?;
        members.extend(page.members.iter().cloned());
        match page.next_cursor() {
            Some(next) => cursor = Some(next.to_string()),
            None => break,
        }
    }

    tracing::trace!(channel_id = %channel_id, count = members.len(), "Listed channel members");
    Ok(members)
}
