use std::io::{BufRead, Write};

use chrono_tz::Tz;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    app::{AppError, ReminderApp},
    reminder::{Reminder, ReminderTrigger},
};

const PROMPT: &str = "Remind me ";

const HELP: &str = "\
Type what and when, e.g. \"call mom in 2 hours\".
Units: hours, minutes, seconds.

Commands:
  /list             show reminders, soonest first
  /delete N [M ...] delete reminders by their number in /list
  /help             show this message
  /quit             exit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Remind(String),
    List,
    Delete(Vec<usize>),
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum CommandError {
    BadPosition(String),
    MissingPosition,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::BadPosition(position) => {
                write!(f, "\"{position}\" is not a reminder number.")
            }
            CommandError::MissingPosition => write!(f, "Which reminder? Usage: /delete N"),
        }
    }
}

/// Known commands are routed as such; every other line, slash or not, is
/// reminder input.
fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let remind = Command::Remind(line.to_string());
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(remind));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    let command = match (name.as_str(), args.as_slice()) {
        ("list", []) => Command::List,
        ("help", []) => Command::Help,
        ("quit", []) => Command::Quit,
        ("delete", []) => return Err(CommandError::MissingPosition),
        ("delete", args) if args.iter().all(|arg| arg.bytes().all(|b| b.is_ascii_digit())) => {
            Command::Delete(parse_positions(args)?)
        }
        _ => remind,
    };

    Ok(Some(command))
}

fn parse_positions(args: &[&str]) -> Result<Vec<usize>, CommandError> {
    args.iter()
        .map(|arg| match arg.parse::<usize>() {
            Ok(position) if position > 0 => Ok(position - 1),
            _ => Err(CommandError::BadPosition(arg.to_string())),
        })
        .collect()
}

/// Short date, medium time: `10/16/26, 2:05:09 PM`.
pub fn format_trigger(trigger: &ReminderTrigger, timezone: Tz) -> String {
    trigger
        .time()
        .with_timezone(&timezone)
        .format("%-m/%-d/%y, %-I:%M:%S %p")
        .to_string()
}

/// Reads `input` line by line on its own thread. A read that never returns
/// does not keep the runtime from shutting down.
pub fn spawn_line_reader<R>(input: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    log::error!("Could not read input: {error}");
                    break;
                }
            }
        }
    });

    rx
}

pub struct TerminalInterface<'a> {
    app: &'a ReminderApp,
    timezone: Tz,
}

impl<'a> TerminalInterface<'a> {
    pub fn new(app: &'a ReminderApp, timezone: Tz) -> Self {
        Self { app, timezone }
    }

    /// Handles lines until `/quit`, end of input or `shutdown`.
    pub async fn run<W>(
        &self,
        mut lines: mpsc::Receiver<String>,
        mut output: W,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()>
    where
        W: Write,
    {
        log::info!("Starting terminal interface");

        loop {
            write!(output, "{PROMPT}")?;
            output.flush()?;

            let line = tokio::select! {
                line = lines.recv() => line,
                _ = shutdown.cancelled() => None,
            };
            let Some(line) = line else {
                writeln!(output)?;
                break;
            };

            match parse_command(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => self.execute(command, &mut output).await?,
                Ok(None) => {}
                Err(error) => writeln!(output, "{error}")?,
            }
        }

        log::info!("Terminal interface stopped");
        Ok(())
    }

    async fn execute(&self, command: Command, output: &mut impl Write) -> anyhow::Result<()> {
        match command {
            Command::Remind(text) => match self.app.submit(&text).await {
                Ok(reminder) => writeln!(
                    output,
                    "Reminding you to {} at {}",
                    reminder.text,
                    format_trigger(&reminder.trigger, self.timezone)
                )?,
                Err(AppError::Parse(error)) => {
                    writeln!(output, "Sorry, I did not get that: {error}.")?
                }
                Err(error) => report(error, output)?,
            },
            Command::List => match self.app.reminders().await {
                Ok(reminders) => self.write_list(&reminders, output)?,
                Err(error) => report(error, output)?,
            },
            Command::Delete(positions) => match self.app.delete_at(&positions).await {
                Ok(deleted) => {
                    for reminder in deleted {
                        writeln!(output, "Deleted {}", reminder.text)?;
                    }
                }
                Err(error @ AppError::NoSuchPosition(_)) => writeln!(output, "{error}.")?,
                Err(error) => report(error, output)?,
            },
            Command::Help => writeln!(output, "{HELP}")?,
            Command::Quit => {}
        }

        Ok(())
    }

    fn write_list(&self, reminders: &[Reminder], output: &mut impl Write) -> anyhow::Result<()> {
        if reminders.is_empty() {
            writeln!(output, "No reminders.")?;
        }

        for (position, reminder) in reminders.iter().enumerate() {
            writeln!(
                output,
                "{}. {} at {}",
                position + 1,
                reminder.text,
                format_trigger(&reminder.trigger, self.timezone)
            )?;
        }

        Ok(())
    }
}

fn report(error: AppError, output: &mut impl Write) -> anyhow::Result<()> {
    log::error!("Command failed: {error:#}");
    writeln!(output, "Something went wrong: {error:#}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, sync::Arc, time::Duration};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        reminder::ReminderId,
        scheduling::{NotificationReminderScheduler, ReminderDeliveryChannel, ReminderMessageType},
        storage::{InMemoryReminderStorage, NewReminder, ReminderStorage},
    };

    struct SilentDeliveryChannel;

    #[async_trait]
    impl ReminderDeliveryChannel for SilentDeliveryChannel {
        async fn send_reminder_notification(
            &self,
            _reminder: &Reminder,
            _message: ReminderMessageType,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct LockedStorage;

    #[async_trait]
    impl ReminderStorage for LockedStorage {
        async fn insert(&self, _reminder: NewReminder) -> anyhow::Result<Reminder> {
            anyhow::bail!("database is locked")
        }

        async fn get(&self, _id: ReminderId) -> anyhow::Result<Option<Reminder>> {
            anyhow::bail!("database is locked")
        }

        async fn get_all(&self) -> anyhow::Result<Vec<Reminder>> {
            anyhow::bail!("database is locked")
        }

        async fn delete(&self, _ids: &[ReminderId]) -> anyhow::Result<u64> {
            anyhow::bail!("database is locked")
        }
    }

    fn app_with(storage: Arc<dyn ReminderStorage>) -> ReminderApp {
        ReminderApp::new(
            storage,
            Arc::new(NotificationReminderScheduler::new(Arc::new(
                SilentDeliveryChannel,
            ))),
        )
    }

    fn app() -> ReminderApp {
        app_with(Arc::new(InMemoryReminderStorage::new()))
    }

    async fn run(app: &ReminderApp, input: &str) -> String {
        let lines = spawn_line_reader(Cursor::new(input.as_bytes().to_vec()));
        let mut output = Vec::new();
        TerminalInterface::new(app, chrono_tz::UTC)
            .run(lines, &mut output, CancellationToken::new())
            .await
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn commands_are_parsed() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("/list"), Ok(Some(Command::List)));
        assert_eq!(parse_command("/LIST"), Ok(Some(Command::List)));
        assert_eq!(parse_command("/help"), Ok(Some(Command::Help)));
        assert_eq!(parse_command("/quit"), Ok(Some(Command::Quit)));
        assert_eq!(
            parse_command("/delete 1 3"),
            Ok(Some(Command::Delete(vec![0, 2])))
        );
        assert_eq!(
            parse_command(" nap in 20 minutes "),
            Ok(Some(Command::Remind("nap in 20 minutes".to_string())))
        );
    }

    #[test]
    fn unknown_slash_lines_are_reminder_input() {
        for line in [
            "/etc backup in 2 hours",
            "/snooze",
            "/list groceries in 1 hour",
            "/delete old logs in 10 minutes",
        ] {
            assert_eq!(
                parse_command(line),
                Ok(Some(Command::Remind(line.to_string()))),
                "line = {line:?}"
            );
        }
    }

    #[test]
    fn malformed_positions_are_rejected() {
        assert_eq!(parse_command("/delete"), Err(CommandError::MissingPosition));
        assert_eq!(
            parse_command("/delete 0"),
            Err(CommandError::BadPosition("0".to_string()))
        );
        assert_eq!(
            parse_command("/delete 99999999999999999999999"),
            Err(CommandError::BadPosition(
                "99999999999999999999999".to_string()
            ))
        );
    }

    #[test]
    fn trigger_uses_short_date_and_medium_time() {
        let trigger =
            ReminderTrigger::new(Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 9).unwrap());

        assert_eq!(
            format_trigger(&trigger, chrono_tz::UTC),
            "10/16/26, 2:05:09 PM"
        );
        assert_eq!(
            format_trigger(&trigger, chrono_tz::Asia::Tokyo),
            "10/16/26, 11:05:09 PM"
        );
    }

    #[tokio::test]
    async fn line_reader_forwards_lines_until_end_of_input() {
        let mut lines = spawn_line_reader(Cursor::new(b"first\nsecond\n".to_vec()));

        assert_eq!(lines.recv().await.as_deref(), Some("first"));
        assert_eq!(lines.recv().await.as_deref(), Some("second"));
        assert_eq!(lines.recv().await, None);
    }

    #[tokio::test]
    async fn reminders_are_created_listed_and_deleted() {
        let app = app();

        let output = run(
            &app,
            "call mom in 2 hours\nwater plants in 5 minutes\n/list\n/delete 1\n/list\n/quit\n",
        )
        .await;

        assert!(output.contains("Reminding you to call mom at "));
        assert!(output.contains("1. water plants at "));
        assert!(output.contains("2. call mom at "));
        let (_, after_delete) = output.split_once("Deleted water plants").unwrap();
        assert!(after_delete.contains("1. call mom at "));
        assert!(!after_delete.contains("water plants"));

        let remaining = app.reminders().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].text, "call mom");
    }

    #[tokio::test]
    async fn slash_prefixed_reminder_is_created() {
        let app = app();

        let output = run(&app, "/etc backup in 2 hours\n").await;

        assert!(output.contains("Reminding you to /etc backup at "));
        assert_eq!(app.reminders().await.unwrap()[0].text, "/etc backup");
    }

    #[tokio::test]
    async fn help_lists_commands() {
        let app = app();

        let output = run(&app, "/help\n").await;

        assert!(output.contains("call mom in 2 hours"));
        for command in ["/list", "/delete N", "/help", "/quit"] {
            assert!(output.contains(command), "missing {command}");
        }
    }

    #[tokio::test]
    async fn unparseable_input_gets_a_hint() {
        let app = app();

        let output = run(&app, "call mom sometime\n").await;

        assert!(output.contains("Sorry, I did not get that"));
        assert!(app.reminders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_list_and_bad_positions_are_reported() {
        let app = app();

        let output = run(&app, "/list\n/delete 4\n").await;

        assert!(output.contains("No reminders."));
        assert!(output.contains("There is no reminder number 4."));
    }

    #[tokio::test]
    async fn storage_errors_are_reported_and_session_continues() {
        let app = app_with(Arc::new(LockedStorage));

        let output = run(&app, "/list\ncall mom in 1 hour\n/delete 1\n/help\n").await;

        assert_eq!(output.matches("Something went wrong: database is locked").count(), 3);
        assert!(output.contains("/quit"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_session_while_input_is_pending() {
        let app = app();
        let (_tx, lines) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let mut output = Vec::new();

        let trigger_shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger_shutdown.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            TerminalInterface::new(&app, chrono_tz::UTC).run(lines, &mut output, shutdown),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }
}
