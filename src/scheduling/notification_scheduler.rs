use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::{
    sync::{RwLock, mpsc},
    task::{self, JoinHandle},
};
use tokio_util::sync::CancellationToken;

use crate::reminder::{Reminder, ReminderId, ReminderTrigger};

use super::{
    ReminderDeliveryChannel, ReminderMessageType, ReminderScheduler, ScheduleRequest,
    ScheduledReminder,
};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug)]
enum ReminderEvent {
    Schedule,
    Trigger,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReminderState {
    Pending,
    Scheduled,
    Delivered,
    Cancelled,
}

impl ReminderState {
    fn is_final(self) -> bool {
        matches!(self, ReminderState::Delivered | ReminderState::Cancelled)
    }
}

struct ScheduledReminderHandle {
    task: JoinHandle<()>,
    tx: mpsc::Sender<ReminderEvent>,
}

struct CleanupTask(CancellationToken);

type ReminderTaskStore = RwLock<HashMap<ReminderId, ScheduledReminderHandle>>;

/// Keeps one task per pending reminder and hands each reminder to the
/// delivery channel once its trigger time is reached.
pub struct NotificationReminderScheduler {
    tasks: Arc<ReminderTaskStore>,
    delivery_channel: Arc<dyn ReminderDeliveryChannel>,
    cleanup_task: CleanupTask,
}

impl NotificationReminderScheduler {
    pub fn new(delivery_channel: Arc<dyn ReminderDeliveryChannel>) -> Self {
        let tasks = Arc::new(RwLock::new(HashMap::new()));
        let cleanup_task = Self::spawn_cleanup_task(Arc::clone(&tasks));

        Self {
            tasks,
            delivery_channel,
            cleanup_task,
        }
    }

    fn create_reminder_task(&self, reminder: Reminder) -> anyhow::Result<ScheduledReminderHandle> {
        let reminder_id = reminder.id;
        log::info!("Starting task for reminder {reminder_id}");
        let (tx, rx) = mpsc::channel(10);

        // Queued before the task runs so a cancel can never overtake it.
        tx.try_send(ReminderEvent::Schedule)?;

        let tx_clone = tx.clone();
        let delivery_channel = Arc::clone(&self.delivery_channel);
        let task = task::spawn(async move {
            run_reminder(reminder, delivery_channel.as_ref(), rx, tx_clone).await;
        });

        Ok(ScheduledReminderHandle { task, tx })
    }

    fn spawn_cleanup_task(tasks: Arc<ReminderTaskStore>) -> CleanupTask {
        let shutdown = CancellationToken::new();
        let task_shutdown = shutdown.child_token();
        task::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(CLEANUP_INTERVAL) => {
                        Self::clean_finished_tasks(&tasks).await;
                    }
                    _ = task_shutdown.cancelled() => {
                        log::info!("Cleanup task shutting down");
                        break;
                    }
                };
            }
        });

        CleanupTask(shutdown)
    }

    async fn clean_finished_tasks(tasks: &ReminderTaskStore) {
        let mut tasks = tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, handle| !handle.task.is_finished());
        let after = tasks.len();

        if before != after {
            log::info!("Cleaned up {} finished reminder tasks", before - after);
        }
    }
}

impl Drop for NotificationReminderScheduler {
    fn drop(&mut self) {
        self.cleanup_task.0.cancel();
    }
}

#[async_trait]
impl ReminderScheduler for NotificationReminderScheduler {
    async fn schedule_reminder(
        &self,
        schedule_request: ScheduleRequest,
    ) -> anyhow::Result<ScheduledReminder> {
        let reminder_id = schedule_request.reminder.id;
        if let Entry::Vacant(e) = self.tasks.write().await.entry(reminder_id) {
            let handle = self.create_reminder_task(schedule_request.reminder)?;
            e.insert(handle);

            Ok(ScheduledReminder::new(reminder_id))
        } else {
            anyhow::bail!("Reminder {reminder_id} is already scheduled")
        }
    }

    async fn cancel_reminder(&self, scheduled_reminder: &ScheduledReminder) -> anyhow::Result<()> {
        let Some(handle) = self.tasks.write().await.remove(&scheduled_reminder.id) else {
            anyhow::bail!("No such reminder {}", scheduled_reminder.id)
        };

        if handle.task.is_finished() || handle.tx.send(ReminderEvent::Cancel).await.is_err() {
            log::debug!(
                "Reminder {} already finished, nothing to cancel",
                scheduled_reminder.id
            );
        }

        Ok(())
    }
}

async fn run_reminder(
    reminder: Reminder,
    delivery: &dyn ReminderDeliveryChannel,
    mut rx: mpsc::Receiver<ReminderEvent>,
    tx: mpsc::Sender<ReminderEvent>,
) {
    let mut state = ReminderState::Pending;
    while let Some(event) = rx.recv().await {
        state = handle_event(&reminder, state, &event, delivery, &tx).await;
        if state.is_final() {
            break;
        }
    }
}

async fn handle_event(
    reminder: &Reminder,
    current_state: ReminderState,
    event: &ReminderEvent,
    delivery: &dyn ReminderDeliveryChannel,
    tx: &mpsc::Sender<ReminderEvent>,
) -> ReminderState {
    let id = reminder.id;
    match (current_state, event) {
        (ReminderState::Pending, ReminderEvent::Schedule) => {
            let delay = get_target_delay(&reminder.trigger, Utc::now());

            notify(delivery, reminder, ReminderMessageType::Scheduled).await;

            log::info!("[SCHEDULE] Sleeping for {delay:?} delay. ReminderId {id}");

            send_after_delay(ReminderEvent::Trigger, tx.clone(), delay);

            ReminderState::Scheduled
        }
        (ReminderState::Scheduled, ReminderEvent::Trigger) => {
            log::info!("[FIRE] ReminderId {id}");

            notify(delivery, reminder, ReminderMessageType::Fired).await;

            ReminderState::Delivered
        }
        (_, ReminderEvent::Cancel) => {
            log::info!("[CANCEL] ReminderId {id}");

            notify(delivery, reminder, ReminderMessageType::Cancelled).await;

            ReminderState::Cancelled
        }
        (state, event) => {
            log::warn!(
                "Received unknown state and event combination for reminder. [state = {state:?}, event = {event:?}, reminder_id = {id}]"
            );

            state
        }
    }
}

async fn notify(
    delivery: &dyn ReminderDeliveryChannel,
    reminder: &Reminder,
    message: ReminderMessageType,
) {
    if let Err(error) = delivery.send_reminder_notification(reminder, message).await {
        log::error!(
            "Could not deliver {message:?} notification for reminder {}: {error:#}",
            reminder.id
        );
    }
}

fn send_after_delay(ev: ReminderEvent, tx: mpsc::Sender<ReminderEvent>, delay: Duration) {
    task::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(ev).await;
    });
}

/// Time left until `trigger`; zero once it has passed.
pub(crate) fn get_target_delay(trigger: &ReminderTrigger, now: DateTime<Utc>) -> Duration {
    (*trigger.time() - now).to_std().unwrap_or(Duration::ZERO)
}
