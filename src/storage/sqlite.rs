mod model;

use std::str::FromStr;

use async_trait::async_trait;
use model::ReminderStorageModel;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use uuid::Uuid;

use crate::reminder::{Reminder, ReminderId};

use super::{NewReminder, ReminderStorage};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reminders (
    id TEXT PRIMARY KEY NOT NULL,
    text TEXT NOT NULL,
    trigger_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS reminders_trigger_at ON reminders (trigger_at);
";

#[derive(Debug, Error)]
pub enum SqliteReminderError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("Stored reminder id is not a UUID: {0}")]
    InvalidId(#[from] uuid::Error),

    #[error("Stored trigger time is out of range: {0}")]
    InvalidTrigger(i64),
}

pub struct SqliteReminderStorage {
    pool: sqlx::SqlitePool,
}

impl SqliteReminderStorage {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `database_url` and makes
    /// sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteReminderError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // An in-memory database lives only as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let storage = Self::new(pool);
        storage.migrate().await?;

        log::info!("Opened reminder database {database_url}");
        Ok(storage)
    }

    async fn migrate(&self) -> Result<(), SqliteReminderError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Reminder>, SqliteReminderError> {
        let reminders = sqlx::query_as::<_, ReminderStorageModel>(
            "SELECT id, text, trigger_at FROM reminders ORDER BY trigger_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        reminders.into_iter().map(Reminder::try_from).collect()
    }

    async fn delete_all(&self, ids: &[ReminderId]) -> Result<u64, SqliteReminderError> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;

        for id in ids {
            removed += sqlx::query("DELETE FROM reminders WHERE id = ?")
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(removed)
    }
}

#[async_trait]
impl ReminderStorage for SqliteReminderStorage {
    async fn insert(&self, reminder: NewReminder) -> anyhow::Result<Reminder> {
        let NewReminder { text, trigger } = reminder;
        let ReminderStorageModel {
            id,
            text,
            trigger_at,
        } = Reminder {
            id: Uuid::new_v4(),
            text,
            trigger,
        }
        .into();

        let created_reminder = sqlx::query_as::<_, ReminderStorageModel>(
            "INSERT INTO reminders (id, text, trigger_at)
VALUES (?, ?, ?) RETURNING id, text, trigger_at",
        )
        .bind(id)
        .bind(text)
        .bind(trigger_at)
        .fetch_one(&self.pool)
        .await
        .map_err(SqliteReminderError::from)?;

        Ok(Reminder::try_from(created_reminder)?)
    }

    async fn get(&self, id: ReminderId) -> anyhow::Result<Option<Reminder>> {
        let reminder = sqlx::query_as::<_, ReminderStorageModel>(
            "SELECT id, text, trigger_at FROM reminders WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(SqliteReminderError::from)?;

        Ok(reminder.map(Reminder::try_from).transpose()?)
    }

    async fn get_all(&self) -> anyhow::Result<Vec<Reminder>> {
        Ok(self.fetch_all().await?)
    }

    async fn delete(&self, ids: &[ReminderId]) -> anyhow::Result<u64> {
        Ok(self.delete_all(ids).await?)
    }
}
