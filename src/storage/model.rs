use crate::reminder::ReminderTrigger;

pub struct NewReminder {
    pub text: String,
    pub trigger: ReminderTrigger,
}
