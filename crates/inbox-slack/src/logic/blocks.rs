//! Block Kit rendering for inbox notifications

use inbox::logic::{ActionStyle, InboxAction, NotificationKind, ReceivedInboxEntry};
use serde_json::{Value, json};

/// Block id of the button row, used to route interactions back to the inbox
pub const ACTIONS_BLOCK_ID: &str = "inbox_entry_actions";

/// Plain-text summary used as the notification fallback
pub fn notification_text(entry: &ReceivedInboxEntry, kind: NotificationKind) -> String {
    match kind {
        NotificationKind::New => format!("New message from <@{}>", entry.sender_id),
        NotificationKind::Reminder => format!("Reminder: message from <@{}>", entry.sender_id),
    }
}

/// Button payload identifying the entry: `"{sender_id}:{message_ts}"`
pub fn action_value(entry: &ReceivedInboxEntry) -> String {
    format!("{}:{}", entry.sender_id, entry.message_ts())
}

/// Inverse of [`action_value`]
pub fn parse_action_value(value: &str) -> Option<(&str, &str)> {
    value
        .split_once(':')
        .filter(|(sender, ts)| !sender.is_empty() && !ts.is_empty())
}

fn button(action: &InboxAction, value: &str) -> Value {
    let mut button = json!({
        "type": "button",
        "text": {"type": "plain_text", "text": action.label, "emoji": true},
        "action_id": action.action_id,
        "value": value,
    });
    match action.style {
        Some(ActionStyle::Primary) => button["style"] = json!("primary"),
        Some(ActionStyle::Danger) => button["style"] = json!("danger"),
        Some(ActionStyle::Default) | None => {}
    }
    button
}

fn deadline_context(entry: &ReceivedInboxEntry) -> Option<Value> {
    let deadline = entry.entry.deadline?;
    let unix = deadline.get_inner().timestamp();
    let text = format!("Deadline: <!date^{unix}^{{date_short_pretty}} at {{time}}|{deadline}>");
    Some(json!({
        "type": "context",
        "elements": [{"type": "mrkdwn", "text": text}],
    }))
}

/// Blocks for a new-entry or reminder notification
pub fn notification_blocks(entry: &ReceivedInboxEntry, kind: NotificationKind) -> Vec<Value> {
    let mut blocks = vec![json!({
        "type": "section",
        "text": {
            "type": "mrkdwn",
            "text": format!("*{}*\n{}", notification_text(entry, kind), entry.entry.description),
        },
    })];

    blocks.extend(deadline_context(entry));

    if !entry.entry.message.url.is_empty() {
        blocks.push(json!({
            "type": "context",
            "elements": [{
                "type": "mrkdwn",
                "text": format!("<{}|View message>", entry.entry.message.url),
            }],
        }));
    }

    if !entry.entry.actions.is_empty() {
        let value = action_value(entry);
        blocks.push(json!({
            "type": "actions",
            "block_id": ACTIONS_BLOCK_ID,
            "elements": entry
                .entry
                .actions
                .iter()
                .map(|action| button(action, &value))
                .collect::<Vec<_>>(),
        }));
    }

    blocks
}

/// Blocks replacing a notification once the recipient has acted on it
pub fn resolved_blocks(entry: &ReceivedInboxEntry, action: &InboxAction) -> Vec<Value> {
    let summary = format!(
        "*Message from <@{}>*\n{}",
        entry.sender_id, entry.entry.description
    );
    vec![
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": summary},
        }),
        json!({
            "type": "context",
            "elements": [{"type": "mrkdwn", "text": format!("You chose {}", action.label)}],
        }),
    ]
}

#[cfg(test)]
mod tests {
    mod unit {
        use super::super::*;
        use inbox::logic::{InboxEntry, MessageRef, ResponseAction};
        use shared::primitives::WrappedChronoDateTime;

        fn entry(url: &str, deadline: Option<&str>) -> ReceivedInboxEntry {
            ReceivedInboxEntry::new(
                InboxEntry {
                    message: MessageRef {
                        channel: "C1".to_string(),
                        ts: "1718000000.000100".to_string(),
                        url: url.to_string(),
                    },
                    description: "Please approve the budget".to_string(),
                    actions: vec![
                        ResponseAction::Accept.to_action(),
                        ResponseAction::ThumbsUp.to_action(),
                    ],
                    deadline: deadline.map(|d| WrappedChronoDateTime::try_from(d).unwrap()),
                    reminders: None,
                },
                "U_SENDER",
            )
        }

        #[test]
        fn test_notification_blocks_layout() {
            let blocks = notification_blocks(
                &entry("https://example.slack.com/archives/C1/p1", Some("2024-06-03T00:00:00Z")),
                NotificationKind::New,
            );

            assert_eq!(blocks.len(), 4);
            assert_eq!(
                blocks[0]["text"]["text"],
                "*New message from <@U_SENDER>*\nPlease approve the budget"
            );
            let deadline = blocks[1]["elements"][0]["text"].as_str().unwrap();
            assert!(
                deadline.starts_with("Deadline: <!date^1717372800^{date_short_pretty} at {time}|")
            );
            assert_eq!(
                blocks[2]["elements"][0]["text"],
                "<https://example.slack.com/archives/C1/p1|View message>"
            );

            let buttons = blocks[3]["elements"].as_array().unwrap();
            assert_eq!(blocks[3]["block_id"], ACTIONS_BLOCK_ID);
            assert_eq!(buttons.len(), 2);
            assert_eq!(buttons[0]["action_id"], "message_action_accept");
            assert_eq!(buttons[0]["style"], "primary");
            assert_eq!(buttons[0]["value"], "U_SENDER:1718000000.000100");
            assert_eq!(buttons[1]["text"]["text"], "👍 Thumbs Up");
            assert!(buttons[1].get("style").is_none());
        }

        #[test]
        fn test_reminder_without_link_or_deadline() {
            let blocks = notification_blocks(&entry("", None), NotificationKind::Reminder);

            assert_eq!(blocks.len(), 2);
            assert!(
                blocks[0]["text"]["text"]
                    .as_str()
                    .unwrap()
                    .starts_with("*Reminder: message from <@U_SENDER>*")
            );
            assert_eq!(blocks[1]["type"], "actions");
        }

        #[test]
        fn test_action_value_round_trip() {
            let entry = entry("", None);
            let value = action_value(&entry);
            assert_eq!(
                parse_action_value(&value),
                Some(("U_SENDER", "1718000000.000100"))
            );
            assert_eq!(parse_action_value("no-separator"), None);
            assert_eq!(parse_action_value(":1.0"), None);
        }

        #[test]
        fn test_resolved_blocks_mention_choice() {
            let blocks = resolved_blocks(&entry("", None), &ResponseAction::Accept.to_action());
            assert_eq!(blocks[1]["elements"][0]["text"], "You chose ✅ Accept");
        }
    }
}
