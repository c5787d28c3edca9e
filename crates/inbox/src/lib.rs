//! Inbox crate: actionable follow-ups attached to chat messages
//!
//! A sender attaches a task to a message, the task fans out to every member
//! of the message's channel, and each recipient resolves it with one of the
//! offered actions.
//!
//! ## Core Concepts
//!
//! - **SentInboxEntry**: the sender's copy, with the fixed recipient list and
//!   one resolution per recipient.
//!
//! - **ReceivedInboxEntry**: a recipient's copy, with the sender id and the
//!   timestamps of notifications posted about it.
//!
//! - **ReminderSchedule**: fixed lead times before a deadline at which
//!   reminders are due.
//!
//! - **ChatPlatformLike**: the chat capabilities the engine needs (member
//!   listing, permalinks, notifications, ephemeral messages).
//!
//! - **StoreLike**: hash-style key-value persistence; [`repository::Repository`]
//!   is the libsql backend and [`repository::MemoryStore`] the in-process one.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inbox::{InboxService, InboxServiceParams};
//! use inbox::repository::{InboxRepository, Repository};
//!
//! let (_db, store) = Repository::connect(&database_url).await?;
//! let service = InboxService::new(InboxServiceParams {
//!     repository: InboxRepository::new(Arc::new(store), Some("prod")),
//!     platform: Arc::new(slack_platform),
//!     reminder_schedule: ReminderSchedule::default(),
//!     call_timeout: Some(Duration::from_secs(10)),
//! });
//! service.create_entry(params).await?;
//! ```

pub mod logic;
pub mod repository;
pub mod service;
#[cfg(test)]
pub mod test;

pub use service::{InboxService, InboxServiceParams};
