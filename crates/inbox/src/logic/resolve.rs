//! Recording recipient resolutions

use shared::error::CommonError;
use shared::primitives::WrappedChronoDateTime;
use tracing::{debug, info};

use super::action::InboxAction;
use super::entry::SentInboxEntry;
use crate::repository::InboxRepository;

/// Record `recipient_id`'s choice on the sender's copy of an entry.
///
/// A later resolution from the same recipient replaces the earlier one.
/// Returns `None` when the sender has no entry with `message_ts`.
pub async fn resolve_entry(
    repository: &InboxRepository,
    sender_id: &str,
    message_ts: &str,
    recipient_id: &str,
    action: &InboxAction,
    now: WrappedChronoDateTime,
) -> Result<Option<SentInboxEntry>, CommonError> {
    let mut sent_entries = repository.get_sent(sender_id).await?;
    let Some(target) = sent_entries
        .iter_mut()
        .find(|e| e.message_ts() == message_ts)
    else {
        debug!(sender_id = %sender_id, message_ts = %message_ts, "No inbox entry to resolve");
        return Ok(None);
    };

    if !target.is_recipient(recipient_id) {
        return Err(CommonError::InvalidRequest {
            msg: format!("{recipient_id} is not a recipient of inbox entry {message_ts}"),
            source: None,
        });
    }

    // Store the entry's own copy of the action so labels stay consistent
    let Some(chosen) = target.entry.find_action(&action.action_id).cloned() else {
        return Err(CommonError::InvalidRequest {
            msg: format!(
                "Action {} is not offered by inbox entry {message_ts}",
                action.action_id
            ),
            source: None,
        });
    };

    target.resolve(recipient_id, chosen, now);
    let resolved = target.clone();
    repository.set_sent(sender_id, &sent_entries).await?;

    info!(
        sender_id = %sender_id,
        message_ts = %message_ts,
        recipient_id = %recipient_id,
        action_id = %action.action_id,
        "Resolved inbox entry"
    );
    Ok(Some(resolved))
}

/// Remove an entry from one recipient's received list
///
/// The entry is identified by its sender and message ts, the same key
/// deletion uses.
pub async fn dismiss_received(
    repository: &InboxRepository,
    recipient_id: &str,
    sender_id: &str,
    message_ts: &str,
) -> Result<bool, CommonError> {
    let mut inbox = repository.get_received(recipient_id).await?;
    let before = inbox.len();
    inbox.retain(|e| !(e.message_ts() == message_ts && e.sender_id == sender_id));
    if inbox.len() == before {
        return Ok(false);
    }

    repository
        .set_received_many([(recipient_id.to_string(), inbox)].into_iter().collect())
        .await?;
    debug!(
        recipient_id = %recipient_id,
        sender_id = %sender_id,
        message_ts = %message_ts,
        "Dismissed received entry"
    );
    Ok(true)
}
