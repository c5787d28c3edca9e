//! Logic layer for inbox crate
//! Domain model, reminder schedule and the entry lifecycle operations

pub mod action;
mod bounded;
pub mod create;
pub mod delete;
pub mod dispatch;
pub mod entry;
pub mod platform;
pub mod reminder;
pub mod resolve;

// Re-export commonly used types
pub use action::{ActionStyle, InboxAction, ResponseAction};
pub use bounded::BoundedPlatform;
pub use dispatch::DispatchReport;
pub use entry::{
    CreateInboxEntryParams, CreateInboxEntryResponse, InboxEntry, InboxEntryResolution,
    MessageRef, ReceivedInboxEntry, SentInboxEntry, SourceMessage,
};
pub use platform::{
    ChatPlatformLike, DeliveryError, EphemeralSenderLike, MemberListerLike, MemberPage,
    MessageHandle, NotificationKind, NotificationSenderLike, PermalinkResolverLike,
};
pub use reminder::{ReminderSchedule, compute_reminders};
