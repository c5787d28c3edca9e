//! Response actions a recipient can pick for an inbox entry
//!
//! The persisted form is [`InboxAction`] (label, optional button style and
//! the platform action id). [`ResponseAction`] is the closed catalogue the
//! senders choose from when composing an entry.

use serde::{Deserialize, Serialize};

/// Button style for an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStyle {
    Default,
    Primary,
    Danger,
}

/// An action as stored on an entry and rendered as a button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxAction {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ActionStyle>,
    /// Identifier sent back by the platform when the button is clicked.
    /// Resolutions are classified by comparing this value.
    pub action_id: String,
}

impl InboxAction {
    pub fn new(
        label: impl Into<String>,
        style: Option<ActionStyle>,
        action_id: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            style,
            action_id: action_id.into(),
        }
    }

    /// Whether two actions classify the same way
    pub fn same_kind(&self, other: &InboxAction) -> bool {
        self.action_id == other.action_id
    }

    /// The catalogue entry this action corresponds to, if any
    pub fn response_action(&self) -> Option<ResponseAction> {
        ResponseAction::from_action_id(&self.action_id)
    }
}

/// The built-in set of response actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseAction {
    Done,
    Dismiss,
    Accept,
    Decline,
    ThumbsUp,
}

impl ResponseAction {
    pub const ALL: [ResponseAction; 5] = [
        ResponseAction::Done,
        ResponseAction::Dismiss,
        ResponseAction::Accept,
        ResponseAction::Decline,
        ResponseAction::ThumbsUp,
    ];

    pub const DEFAULTS: [ResponseAction; 2] = [ResponseAction::Done, ResponseAction::Dismiss];

    pub fn action_id(&self) -> &'static str {
        match self {
            ResponseAction::Done => "message_action_done",
            ResponseAction::Dismiss => "message_action_dismiss",
            ResponseAction::Accept => "message_action_accept",
            ResponseAction::Decline => "message_action_decline",
            ResponseAction::ThumbsUp => "message_action_thumbsup",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResponseAction::Done => "✅ Done",
            ResponseAction::Dismiss => "🗑️ Dismiss",
            ResponseAction::Accept => "✅ Accept",
            ResponseAction::Decline => "❌ Decline",
            ResponseAction::ThumbsUp => "👍 Thumbs Up",
        }
    }

    pub fn style(&self) -> Option<ActionStyle> {
        match self {
            ResponseAction::Done | ResponseAction::Accept => Some(ActionStyle::Primary),
            ResponseAction::Decline => Some(ActionStyle::Danger),
            ResponseAction::Dismiss | ResponseAction::ThumbsUp => None,
        }
    }

    pub fn from_action_id(action_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.action_id() == action_id)
    }

    pub fn to_action(self) -> InboxAction {
        InboxAction::new(self.label(), self.style(), self.action_id())
    }

    /// The action set used when the sender does not pick one
    pub fn default_actions() -> Vec<InboxAction> {
        Self::DEFAULTS.into_iter().map(Self::to_action).collect()
    }
}

impl From<ResponseAction> for InboxAction {
    fn from(action: ResponseAction) -> Self {
        action.to_action()
    }
}
