use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

pub type ReminderId = Uuid;

/// Moment a reminder fires. Always whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderTrigger(DateTime<Utc>);

impl ReminderTrigger {
    pub fn new(inner: DateTime<Utc>) -> Self {
        Self(inner.trunc_subsecs(0))
    }

    pub fn from_timestamp(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(Self)
    }

    pub fn time(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub text: String,
    pub trigger: ReminderTrigger,
}
