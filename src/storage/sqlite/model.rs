use uuid::Uuid;

use crate::reminder::{Reminder, ReminderTrigger};

use super::SqliteReminderError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReminderStorageModel {
    pub id: String,
    pub text: String,
    pub trigger_at: i64,
}

impl From<Reminder> for ReminderStorageModel {
    fn from(value: Reminder) -> Self {
        Self {
            id: value.id.to_string(),
            text: value.text,
            trigger_at: value.trigger.timestamp(),
        }
    }
}

impl TryFrom<ReminderStorageModel> for Reminder {
    type Error = SqliteReminderError;

    fn try_from(value: ReminderStorageModel) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&value.id)?;
        let trigger = ReminderTrigger::from_timestamp(value.trigger_at)
            .ok_or(SqliteReminderError::InvalidTrigger(value.trigger_at))?;

        Ok(Self {
            id,
            text: value.text,
            trigger,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_id_is_rejected() {
        let model = ReminderStorageModel {
            id: "not-a-uuid".to_string(),
            text: "text".to_string(),
            trigger_at: 0,
        };

        let result = Reminder::try_from(model);

        assert!(matches!(result, Err(SqliteReminderError::InvalidId(_))));
    }

    #[test]
    fn out_of_range_trigger_is_rejected() {
        let model = ReminderStorageModel {
            id: Uuid::new_v4().to_string(),
            text: "text".to_string(),
            trigger_at: i64::MAX,
        };

        let result = Reminder::try_from(model);

        assert!(matches!(
            result,
            Err(SqliteReminderError::InvalidTrigger(i64::MAX))
        ));
    }
}
