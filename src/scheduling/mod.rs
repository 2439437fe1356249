mod delivery;
mod notification_scheduler;
mod scheduler;

pub use delivery::{ReminderDeliveryChannel, ReminderMessageType};
pub use notification_scheduler::NotificationReminderScheduler;
pub use scheduler::{ReminderScheduler, ScheduleRequest, ScheduledReminder};
