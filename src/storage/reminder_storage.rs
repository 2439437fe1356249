use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::reminder::{Reminder, ReminderId};

use super::NewReminder;

#[async_trait]
pub trait ReminderStorage: Send + Sync {
    async fn insert(&self, reminder: NewReminder) -> anyhow::Result<Reminder>;
    #[cfg_attr(not(test), allow(dead_code))]
    async fn get(&self, id: ReminderId) -> anyhow::Result<Option<Reminder>>;
    /// All reminders, soonest first.
    async fn get_all(&self) -> anyhow::Result<Vec<Reminder>>;
    async fn delete(&self, ids: &[ReminderId]) -> anyhow::Result<u64>;
}

pub struct InMemoryReminderStorage {
    store: RwLock<HashMap<ReminderId, Reminder>>,
}

impl InMemoryReminderStorage {
    pub fn new() -> Self {
        InMemoryReminderStorage {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryReminderStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReminderStorage for InMemoryReminderStorage {
    async fn insert(&self, reminder: NewReminder) -> anyhow::Result<Reminder> {
        let mut store = self.store.write().await;
        let reminder = Reminder {
            id: Uuid::new_v4(),
            text: reminder.text,
            trigger: reminder.trigger,
        };

        store.insert(reminder.id, reminder.clone());
        log::debug!("Stored reminder {}", reminder.id);

        Ok(reminder)
    }

    async fn get(&self, id: ReminderId) -> anyhow::Result<Option<Reminder>> {
        let store = self.store.read().await;
        Ok(store.get(&id).cloned())
    }

    async fn get_all(&self) -> anyhow::Result<Vec<Reminder>> {
        let store = self.store.read().await;
        let mut reminders: Vec<Reminder> = store.values().cloned().collect();
        reminders.sort_by_key(|reminder| (reminder.trigger, reminder.id));

        Ok(reminders)
    }

    async fn delete(&self, ids: &[ReminderId]) -> anyhow::Result<u64> {
        let mut store = self.store.write().await;
        let removed = ids.iter().filter(|id| store.remove(*id).is_some()).count();

        Ok(removed as u64)
    }
}
