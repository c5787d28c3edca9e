//! Reminder delivery
//!
//! One pass over every received list: each entry with a due reminder gets a
//! single reminder notification and its due timestamps are consumed. Sends
//! run against a snapshot; the outcome is written back as per-entry patches
//! against the lists as they are at write time, so entries created, deleted
//! or dismissed during the pass are kept as they are.

use std::collections::BTreeMap;

use shared::error::CommonError;
use shared::primitives::WrappedChronoDateTime;
use tracing::{error, info, warn};

use super::bounded::BoundedPlatform;
use super::entry::ReceivedInboxEntry;
use super::platform::{DeliveryError, NotificationKind};
use crate::repository::InboxRepository;

/// Outcome of one dispatcher pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
    /// Sending stopped early; remaining due reminders are left for the next pass
    pub rate_limited: bool,
}

/// Change to one received entry, keyed by sender and message ts
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReminderPatch {
    sender_id: String,
    message_ts: String,
    /// Ts of the delivered reminder message, `None` when delivery failed
    handle_ts: Option<String>,
}

impl ReminderPatch {
    fn matches(&self, entry: &ReceivedInboxEntry) -> bool {
        entry.sender_id == self.sender_id && entry.message_ts() == self.message_ts
    }
}

fn apply_patches(
    mut inbox: Vec<ReceivedInboxEntry>,
    patches: &[ReminderPatch],
    now: WrappedChronoDateTime,
) -> Vec<ReceivedInboxEntry> {
    for patch in patches {
        for entry in inbox.iter_mut().filter(|e| patch.matches(e)) {
            entry.take_due_reminders(now);
            if let Some(ts) = &patch.handle_ts {
                entry.push_message_ts(ts.clone());
            }
        }
    }
    inbox
}

pub async fn dispatch_due_reminders(
    repository: &InboxRepository,
    platform: &BoundedPlatform<'_>,
    now: WrappedChronoDateTime,
) -> Result<DispatchReport, CommonError> {
    let inboxes = repository.get_all_received().await?;
    let mut report = DispatchReport::default();
    let mut patches: BTreeMap<String, Vec<ReminderPatch>> = BTreeMap::new();

    'users: for (recipient_id, inbox) in inboxes {
        for entry in inbox.iter().filter(|e| e.has_due_reminder(now)) {
            let handle_ts = match platform
                .send_notification(&recipient_id, entry, NotificationKind::Reminder)
                .await
            {
                Ok(handle) => {
                    report.delivered += 1;
                    Some(handle.ts)
                }
                Err(DeliveryError::RateLimited) => {
                    error!(recipient_id = %recipient_id, "Rate limited while sending reminders");
                    report.rate_limited = true;
                    break 'users;
                }
                Err(DeliveryError::Other(reason)) => {
                    warn!(
                        recipient_id = %recipient_id,
                        message_ts = %entry.message_ts(),
                        reason = %reason,
                        "Failed to send reminder"
                    );
                    report.failed += 1;
                    None
                }
            };
            patches
                .entry(recipient_id.clone())
                .or_default()
                .push(ReminderPatch {
                    sender_id: entry.sender_id.clone(),
                    message_ts: entry.message_ts().to_string(),
                    handle_ts,
                });
        }
    }

    let recipient_ids: Vec<String> = patches.keys().cloned().collect();
    repository
        .update_all_received_inboxes(&recipient_ids, |inbox, recipient_id| {
            match patches.get(recipient_id) {
                Some(user_patches) => apply_patches(inbox, user_patches, now),
                None => inbox,
            }
        })
        .await?;

    info!(
        delivered = report.delivered,
        failed = report.failed,
        rate_limited = report.rate_limited,
        "Dispatched due reminders"
    );
    Ok(report)
}
