//! Service layer for inbox crate
//! Holds the store, the chat platform and the settings every operation needs

use std::sync::Arc;
use std::time::Duration;

use shared::error::CommonError;
use shared::primitives::WrappedChronoDateTime;

use crate::{
    logic::{
        BoundedPlatform, ChatPlatformLike, CreateInboxEntryParams, CreateInboxEntryResponse,
        DispatchReport, InboxAction, ReceivedInboxEntry, ReminderSchedule, SentInboxEntry,
        create, delete, dispatch, resolve,
    },
    repository::InboxRepository,
};

/// Main service struct for inbox operations
#[derive(Clone)]
pub struct InboxService {
    pub repository: InboxRepository,
    pub platform: Arc<dyn ChatPlatformLike>,
    pub reminder_schedule: ReminderSchedule,
    /// Upper bound for each chat platform call
    pub call_timeout: Option<Duration>,
}

/// Parameters for creating an InboxService
pub struct InboxServiceParams {
    pub repository: InboxRepository,
    pub platform: Arc<dyn ChatPlatformLike>,
    pub reminder_schedule: ReminderSchedule,
    pub call_timeout: Option<Duration>,
}

impl InboxService {
    pub fn new(params: InboxServiceParams) -> Self {
        Self {
            repository: params.repository,
            platform: params.platform,
            reminder_schedule: params.reminder_schedule,
            call_timeout: params.call_timeout,
        }
    }

    fn bounded_platform(&self) -> BoundedPlatform<'_> {
        BoundedPlatform::new(self.platform.as_ref(), self.call_timeout)
    }

    // --- Entry Lifecycle ---

    pub async fn create_entry(
        &self,
        params: CreateInboxEntryParams,
    ) -> Result<CreateInboxEntryResponse, CommonError> {
        create::create_entry(
            &self.repository,
            &self.bounded_platform(),
            &self.reminder_schedule,
            params,
            WrappedChronoDateTime::now(),
        )
        .await
    }

    /// Returns whether an entry was found and deleted
    pub async fn delete_entry(
        &self,
        sender_id: &str,
        message_ts: &str,
    ) -> Result<bool, CommonError> {
        delete::delete_entry(&self.repository, sender_id, message_ts).await
    }

    pub async fn resolve_entry(
        &self,
        sender_id: &str,
        message_ts: &str,
        recipient_id: &str,
        action: &InboxAction,
    ) -> Result<Option<SentInboxEntry>, CommonError> {
        resolve::resolve_entry(
            &self.repository,
            sender_id,
            message_ts,
            recipient_id,
            action,
            WrappedChronoDateTime::now(),
        )
        .await
    }

    pub async fn dismiss_received(
        &self,
        recipient_id: &str,
        sender_id: &str,
        message_ts: &str,
    ) -> Result<bool, CommonError> {
        resolve::dismiss_received(&self.repository, recipient_id, sender_id, message_ts).await
    }

    // --- Reads ---

    pub async fn read_sent(&self, user_id: &str) -> Result<Vec<SentInboxEntry>, CommonError> {
        self.repository.get_sent(user_id).await
    }

    pub async fn read_received(
        &self,
        user_id: &str,
    ) -> Result<Vec<ReceivedInboxEntry>, CommonError> {
        self.repository.get_received(user_id).await
    }

    // --- Reminders ---

    pub async fn dispatch_due_reminders(&self) -> Result<DispatchReport, CommonError> {
        self.dispatch_due_reminders_at(WrappedChronoDateTime::now())
            .await
    }

    pub async fn dispatch_due_reminders_at(
        &self,
        now: WrappedChronoDateTime,
    ) -> Result<DispatchReport, CommonError> {
        dispatch::dispatch_due_reminders(&self.repository, &self.bounded_platform(), now).await
    }

    /// Tell a single user something in a channel without posting publicly
    pub async fn send_ephemeral_notice(
        &self,
        channel_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<(), CommonError> {
        self.bounded_platform()
            .send_ephemeral(channel_id, user_id, text)
            .await
    }
}
