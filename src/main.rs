mod app;
mod appsettings;
mod notification;
mod parser;
mod reminder;
mod scheduling;
mod storage;
mod terminal;

use std::sync::Arc;

use app::ReminderApp;
use appsettings::{AppSettings, StorageKind};
use chrono::Utc;
use notification::ConsoleDeliveryChannel;
use scheduling::NotificationReminderScheduler;
use storage::{InMemoryReminderStorage, ReminderStorage, sqlite::SqliteReminderStorage};
use terminal::{TerminalInterface, spawn_line_reader};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = AppSettings::new()?;
    log::debug!("Loaded settings {settings:?}");
    let timezone = settings.display.timezone()?;

    let reminder_storage: Arc<dyn ReminderStorage> = match settings.storage.kind {
        StorageKind::Sqlite => {
            Arc::new(SqliteReminderStorage::connect(&settings.storage.database_url).await?)
        }
        StorageKind::Memory => {
            log::warn!("Using in-memory storage, reminders are lost on exit");
            Arc::new(InMemoryReminderStorage::new())
        }
    };

    let delivery_channel = Arc::new(ConsoleDeliveryChannel::stdout(
        settings.notification.title.clone(),
    ));
    let scheduler = Arc::new(NotificationReminderScheduler::new(delivery_channel));

    let app = ReminderApp::new(reminder_storage, scheduler);
    if let Err(error) = app.restore_pending(Utc::now()).await {
        log::error!("Could not restore pending reminders: {error:#}");
    }

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            log::error!("Could not listen for Ctrl-C: {error}");
            return;
        }
        log::info!("Received Ctrl-C, shutting down");
        ctrl_c.cancel();
    });

    let lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    TerminalInterface::new(&app, timezone)
        .run(lines, std::io::stdout(), shutdown)
        .await
}
