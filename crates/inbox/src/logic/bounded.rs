//! Time-bounded access to the chat platform
//!
//! Every platform call the engine makes goes through [`BoundedPlatform`], so
//! a hung request fails after the configured timeout instead of stalling the
//! whole operation.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use shared::error::CommonError;
use tracing::warn;

use super::entry::ReceivedInboxEntry;
use super::platform::{
    ChatPlatformLike, DeliveryError, MemberListerLike, MemberPage, MessageHandle,
    NotificationKind, list_all_members,
};

async fn with_timeout<T, F>(
    timeout: Option<Duration>,
    operation: &str,
    future: F,
) -> Result<T, CommonError>
where
    F: Future<Output = Result<T, CommonError>>,
{
    match timeout {
        None => future.await,
        Some(limit) => match tokio::time::timeout(limit, future).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation = %operation,
                    timeout_ms = limit.as_millis() as u64,
                    "Platform call timed out"
                );
                Err(CommonError::Timeout {
                    operation: operation.to_string(),
                })
            }
        },
    }
}

#[derive(Clone, Copy)]
pub struct BoundedPlatform<'a> {
    platform: &'a dyn ChatPlatformLike,
    timeout: Option<Duration>,
}

impl<'a> BoundedPlatform<'a> {
    pub fn new(platform: &'a dyn ChatPlatformLike, timeout: Option<Duration>) -> Self {
        Self { platform, timeout }
    }

    /// All members of `channel_id`; each page request is bounded separately
    pub async fn list_all_members(&self, channel_id: &str) -> Result<Vec<String>, CommonError> {
        list_all_members(self, channel_id).await
    }

    pub async fn get_permalink(
        &self,
        channel_id: &str,
        message_ts: &str,
    ) -> Result<String, CommonError> {
        with_timeout(
            self.timeout,
            "get_permalink",
            self.platform.get_permalink(channel_id, message_ts),
        )
        .await
    }

    /// A timed-out delivery is reported as an ordinary delivery failure
    pub async fn send_notification(
        &self,
        recipient_id: &str,
        entry: &ReceivedInboxEntry,
        kind: NotificationKind,
    ) -> Result<MessageHandle, DeliveryError> {
        let send = self.platform.send_notification(recipient_id, entry, kind);
        match self.timeout {
            None => send.await,
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .unwrap_or_else(|_| Err(DeliveryError::Other("timed out".to_string()))),
        }
    }

    pub async fn send_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<(), CommonError> {
        with_timeout(
            self.timeout,
            "send_ephemeral",
            self.platform.send_ephemeral(channel_id, user_id, text),
        )
        .await
    }
}

#[async_trait]
impl MemberListerLike for BoundedPlatform<'_> {
    async fn list_members(
        &self,
        channel_id: &str,
        cursor: Option<&str>,
    ) -> Result<MemberPage, CommonError> {
        with_timeout(
            self.timeout,
            "list_members",
            self.platform.list_members(channel_id, cursor),
        )
        .await
    }
}
