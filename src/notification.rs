use std::{
    io::{self, Write},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    reminder::Reminder,
    scheduling::{ReminderDeliveryChannel, ReminderMessageType},
};

/// Shows fired reminders as a banner on the terminal.
pub struct ConsoleDeliveryChannel<W = io::Stdout> {
    title: String,
    output: Mutex<W>,
}

impl ConsoleDeliveryChannel {
    pub fn stdout(title: impl Into<String>) -> Self {
        Self::new(title, io::stdout())
    }
}

impl<W> ConsoleDeliveryChannel<W>
where
    W: Write + Send + 'static,
{
    pub fn new(title: impl Into<String>, output: W) -> Self {
        Self {
            title: title.into(),
            output: Mutex::new(output),
        }
    }

    fn write_banner(&self, reminder: &Reminder) -> anyhow::Result<()> {
        let mut output = self
            .output
            .lock()
            .map_err(|_| anyhow::anyhow!("Notification output is poisoned"))?;

        writeln!(output, "\n[{}] {}", self.title, reminder.text)?;
        output.flush()?;

        Ok(())
    }
}

#[async_trait]
impl<W> ReminderDeliveryChannel for ConsoleDeliveryChannel<W>
where
    W: Write + Send + 'static,
{
    async fn send_reminder_notification(
        &self,
        reminder: &Reminder,
        message: ReminderMessageType,
    ) -> anyhow::Result<()> {
        match message {
            ReminderMessageType::Fired => self.write_banner(reminder),
            ReminderMessageType::Scheduled => {
                log::info!(
                    "Notification for reminder {} pending at {}",
                    reminder.id,
                    reminder.trigger.time()
                );
                Ok(())
            }
            ReminderMessageType::Cancelled => {
                log::info!("Notification for reminder {} removed", reminder.id);
                Ok(())
            }
        }
    }
}
