//! Entry creation and fan-out

use std::collections::HashMap;

use shared::error::CommonError;
use shared::primitives::WrappedChronoDateTime;
use tracing::{debug, error, info, warn};

use super::bounded::BoundedPlatform;
use super::entry::{
    CreateInboxEntryParams, CreateInboxEntryResponse, InboxEntry, MessageRef, ReceivedInboxEntry,
    SentInboxEntry,
};
use super::platform::{DeliveryError, NotificationKind};
use super::reminder::ReminderSchedule;
use crate::repository::InboxRepository;

/// Create an entry for every member of the source channel.
///
/// Writes the sender's copy first, then optionally notifies recipients one
/// at a time, then prepends a received copy to every recipient's list. The
/// two writes are independent; a failure between them leaves the sender's
/// copy in place.
pub async fn create_entry(
    repository: &InboxRepository,
    platform: &BoundedPlatform<'_>,
    schedule: &ReminderSchedule,
    params: CreateInboxEntryParams,
    now: WrappedChronoDateTime,
) -> Result<CreateInboxEntryResponse, CommonError> {
    let CreateInboxEntryParams {
        message,
        description,
        actions,
        deadline,
        notify_on_create,
        enable_reminders,
    } = params;

    let reminders = match deadline {
        Some(deadline) if enable_reminders => schedule.compute(deadline, now),
        _ => Vec::new(),
    };

    let recipient_ids = platform.list_all_members(&message.channel).await?;

    let url = if message.channel.is_empty() {
        String::new()
    } else {
        platform.get_permalink(&message.channel, &message.ts).await?
    };

    let entry = InboxEntry {
        message: MessageRef {
            channel: message.channel.clone(),
            ts: message.ts.clone(),
            url,
        },
        description,
        actions,
        deadline,
        reminders: Some(reminders),
    };
    let sent = SentInboxEntry::new(entry.clone(), recipient_ids.clone());

    let mut sent_entries = repository.get_sent(&message.user_id).await?;
    sent_entries.insert(0, sent.clone());
    repository.set_sent(&message.user_id, &sent_entries).await?;

    let received = ReceivedInboxEntry::new(entry, message.user_id.clone());
    let mut handles: HashMap<String, Vec<String>> = HashMap::new();
    let mut rate_limited = false;

    if notify_on_create {
        for recipient_id in &recipient_ids {
            match platform
                .send_notification(recipient_id, &received, NotificationKind::New)
                .await
            {
                Ok(handle) => {
                    debug!(
                        recipient_id = %recipient_id,
                        channel = %handle.channel,
                        ts = %handle.ts,
                        "Sent inbox notification"
                    );
                    handles
                        .entry(recipient_id.clone())
                        .or_default()
                        .push(handle.ts);
                }
                Err(DeliveryError::RateLimited) => {
                    error!(
                        recipient_id = %recipient_id,
                        message_ts = %message.ts,
                        "Rate limited while sending inbox notifications"
                    );
                    rate_limited = true;
                    break;
                }
                Err(DeliveryError::Other(reason)) => {
                    warn!(
                        recipient_id = %recipient_id,
                        reason = %reason,
                        "Failed to send inbox notification"
                    );
                }
            }
        }
    }

    let notified = handles.len();
    repository
        .update_all_received_inboxes(&recipient_ids, |mut inbox, recipient_id| {
            let mut copy = received.clone();
            copy.reminder_message_ts = handles.get(recipient_id).cloned();
            inbox.insert(0, copy);
            inbox
        })
        .await?;

    info!(
        sender_id = %message.user_id,
        message_ts = %message.ts,
        recipients = recipient_ids.len(),
        notified,
        rate_limited,
        "Created inbox entry"
    );

    Ok(CreateInboxEntryResponse {
        entry: sent,
        notified,
        rate_limited,
    })
}
