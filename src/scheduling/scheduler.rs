use async_trait::async_trait;

use crate::reminder::{Reminder, ReminderId};

pub struct ScheduleRequest {
    pub reminder: Reminder,
}

impl ScheduleRequest {
    pub fn new(reminder: Reminder) -> Self {
        Self { reminder }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub id: ReminderId,
}

impl ScheduledReminder {
    pub fn new(id: ReminderId) -> Self {
        Self { id }
    }
}

#[async_trait]
pub trait ReminderScheduler: Send + Sync + 'static {
    async fn schedule_reminder(
        &self,
        schedule_request: ScheduleRequest,
    ) -> anyhow::Result<ScheduledReminder>;

    /// Stops a pending reminder. A reminder that already fired is left alone.
    async fn cancel_reminder(&self, scheduled_reminder: &ScheduledReminder) -> anyhow::Result<()>;
}
