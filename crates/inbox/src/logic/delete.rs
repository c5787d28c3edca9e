//! Entry deletion

use shared::error::CommonError;
use tracing::{debug, info};

use crate::repository::InboxRepository;

/// Remove an entry from its sender's list and from every recipient's list.
///
/// A recipient's copy is matched by message ts and sender id. Recipients are
/// updated first, then the sender. Returns `false` when the
/// sender has no entry with `message_ts`; nothing is written in that case.
pub async fn delete_entry(
    repository: &InboxRepository,
    sender_id: &str,
    message_ts: &str,
) -> Result<bool, CommonError> {
    let sent_entries = repository.get_sent(sender_id).await?;
    let Some(target) = sent_entries.iter().find(|e| e.message_ts() == message_ts) else {
        debug!(sender_id = %sender_id, message_ts = %message_ts, "No inbox entry to delete");
        return Ok(false);
    };

    repository
        .update_all_received_inboxes(&target.recipient_ids, |mut inbox, _| {
            inbox.retain(|e| !(e.message_ts() == message_ts && e.sender_id == sender_id));
            inbox
        })
        .await?;

    let recipients = target.recipient_ids.len();
    let remaining: Vec<_> = sent_entries
        .iter()
        .filter(|e| e.message_ts() != message_ts)
        .cloned()
        .collect();
    repository.set_sent(sender_id, &remaining).await?;

    info!(
        sender_id = %sender_id,
        message_ts = %message_ts,
        recipients,
        "Deleted inbox entry"
    );
    Ok(true)
}
