//! Slack adapter for the inbox
//!
//! Implements the inbox platform capabilities on top of the Slack Web API
//! and renders inbox notifications as Block Kit messages.
//!
//! This crate provides:
//! - `SlackClient`, a thin reqwest client for the Web API methods in use
//! - `SlackPlatform`, the `inbox::logic::ChatPlatformLike` implementation
//! - `blocks`, notification rendering
//! - `build_service`, wiring configuration, store and platform together
//!
//! The `inbox-reminders` binary runs the reminder dispatcher against the
//! configured store.

pub mod logic;
mod types;

use std::sync::Arc;

use inbox::logic::ReminderSchedule;
use inbox::repository::{InboxRepository, Repository};
use inbox::{InboxService, InboxServiceParams};
use shared::error::CommonError;
use shared::libsql::local_connection_url;
use tracing::info;

pub use logic::{SlackClient, SlackClientError, SlackPlatform};
pub use types::{
    CACHE_PREFIX_ENV, CALL_TIMEOUT_ENV, DATABASE_PATH_ENV, SLACK_BOT_TOKEN_ENV,
    SlackConfiguration,
};

/// Build an inbox service backed by the local libsql store and Slack.
///
/// The returned database handle must outlive the service.
pub async fn build_service(
    config: &SlackConfiguration,
) -> Result<(libsql::Database, InboxService), CommonError> {
    config.validate()?;

    let url = local_connection_url(&config.database_path)?;
    let (db, store) = Repository::connect(&url).await?;
    info!(path = %config.database_path.display(), "Connected to inbox database");

    let client = Arc::new(SlackClient::new(config.bot_token.clone()));
    let service = InboxService::new(InboxServiceParams {
        repository: InboxRepository::new(Arc::new(store), config.cache_prefix.as_deref()),
        platform: Arc::new(SlackPlatform::new(client)),
        reminder_schedule: ReminderSchedule::default(),
        call_timeout: config.call_timeout(),
    });

    Ok((db, service))
}
