use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    parser::{ParseReminderError, parse_reminder_text},
    reminder::Reminder,
    scheduling::{ReminderScheduler, ScheduleRequest, ScheduledReminder},
    storage::{NewReminder, ReminderStorage},
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseReminderError),

    #[error("There is no reminder number {}", .0 + 1)]
    NoSuchPosition(usize),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// The reminder list together with the notifications pending for it.
pub struct ReminderApp {
    storage: Arc<dyn ReminderStorage>,
    scheduler: Arc<dyn ReminderScheduler>,
}

impl ReminderApp {
    pub fn new(storage: Arc<dyn ReminderStorage>, scheduler: Arc<dyn ReminderScheduler>) -> Self {
        Self { storage, scheduler }
    }

    pub async fn submit(&self, input: &str) -> Result<Reminder, AppError> {
        self.submit_at(input, Utc::now()).await
    }

    pub async fn submit_at(&self, input: &str, now: DateTime<Utc>) -> Result<Reminder, AppError> {
        let parsed = parse_reminder_text(input, now)?;

        let reminder = self
            .storage
            .insert(NewReminder {
                text: parsed.text,
                trigger: parsed.trigger,
            })
            .await?;

        self.scheduler
            .schedule_reminder(ScheduleRequest::new(reminder.clone()))
            .await?;

        log::info!(
            "Created reminder {} firing at {}",
            reminder.id,
            reminder.trigger.time()
        );
        Ok(reminder)
    }

    pub async fn reminders(&self) -> Result<Vec<Reminder>, AppError> {
        Ok(self.storage.get_all().await?)
    }

    /// Deletes the reminders at the given offsets of [`Self::reminders`].
    /// Nothing is deleted if any offset is out of range.
    pub async fn delete_at(&self, positions: &[usize]) -> Result<Vec<Reminder>, AppError> {
        let reminders = self.reminders().await?;
        if let Some(&position) = positions.iter().find(|&&p| p >= reminders.len()) {
            return Err(AppError::NoSuchPosition(position));
        }

        let mut selected: Vec<Reminder> = Vec::with_capacity(positions.len());
        for &position in positions {
            let reminder = &reminders[position];
            if !selected.iter().any(|r| r.id == reminder.id) {
                selected.push(reminder.clone());
            }
        }

        for reminder in &selected {
            if let Err(error) = self
                .scheduler
                .cancel_reminder(&ScheduledReminder::new(reminder.id))
                .await
            {
                log::debug!("No pending notification for {}: {error}", reminder.id);
            }
        }

        let ids: Vec<_> = selected.iter().map(|r| r.id).collect();
        let removed = self.storage.delete(&ids).await?;
        log::info!("Deleted {removed} reminder(s)");

        Ok(selected)
    }

    /// Schedules every stored reminder that has not fired yet. Returns how
    /// many were scheduled; reminders the scheduler refuses are skipped.
    pub async fn restore_pending(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let mut restored = 0;
        for reminder in self.reminders().await? {
            if *reminder.trigger.time() <= now {
                log::debug!("Skipping reminder {} that is already due", reminder.id);
                continue;
            }

            let id = reminder.id;
            match self
                .scheduler
                .schedule_reminder(ScheduleRequest::new(reminder))
                .await
            {
                Ok(_) => restored += 1,
                Err(error) => log::error!("Could not restore reminder {id}: {error:#}"),
            }
        }

        log::info!("Restored {restored} pending reminder(s)");
        Ok(restored)
    }
}
