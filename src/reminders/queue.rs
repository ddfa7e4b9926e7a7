// Reminder queue backed by reminders.json

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use super::delay::ReminderDelay;
use crate::storage::JsonStore;

/// A pending reminder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub user_id: u64,
    pub channel_id: u64,
    pub message: String,
    #[serde(with = "crate::storage::timestamp")]
    pub end_time: DateTime<Utc>,
    pub id: u64,
}

impl Reminder {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReminderFile {
    #[serde(default)]
    reminders: Vec<Reminder>,
    #[serde(default = "first_id")]
    next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for ReminderFile {
    fn default() -> Self {
        Self {
            reminders: Vec::new(),
            next_id: first_id(),
        }
    }
}

/// Persisted list of pending reminders
pub struct ReminderQueue {
    store: JsonStore<ReminderFile>,
}

impl ReminderQueue {
    /// Open the queue, creating an empty file if none exists
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let queue = Self {
            store: JsonStore::open(path)?,
        };

        // A hand-edited file may carry ids at or past next_id; never hand those out again
        queue
            .store
            .update_if(|file| {
                let max_id = file.reminders.iter().map(|r| r.id).max().unwrap_or(0);
                if file.next_id <= max_id {
                    warn!(next_id = file.next_id, max_id, "Reminder next_id behind stored ids, advancing");
                    file.next_id = max_id + 1;
                    ((), true)
                } else {
                    ((), false)
                }
            })
            .await?;

        let pending = queue.len().await;
        info!(pending, "Loaded reminders");
        Ok(queue)
    }

    /// Schedule a reminder `delay` after `now`
    pub async fn add(
        &self,
        user_id: u64,
        channel_id: u64,
        message: &str,
        delay: ReminderDelay,
        now: DateTime<Utc>,
    ) -> Result<Reminder> {
        let end_time = now
            .checked_add_signed(delay.as_duration())
            .with_context(|| format!("Reminder due time out of range: {} from {}", delay, now))?;
        let reminder = self
            .store
            .update(|file| {
                let reminder = Reminder {
                    user_id,
                    channel_id,
                    message: message.to_string(),
                    end_time,
                    id: file.next_id,
                };
                file.next_id += 1;
                file.reminders.push(reminder.clone());
                reminder
            })
            .await?;

        info!(id = reminder.id, user_id, end_time = %reminder.end_time, "Reminder set");
        Ok(reminder)
    }

    /// A user's reminders, soonest first
    pub async fn for_user(&self, user_id: u64) -> Vec<Reminder> {
        let mut reminders: Vec<Reminder> = self
            .store
            .read(|file| {
                file.reminders
                    .iter()
                    .filter(|r| r.user_id == user_id)
                    .cloned()
                    .collect()
            })
            .await;
        reminders.sort_by_key(|r| r.end_time);
        reminders
    }

    /// Cancel reminder `id` if it belongs to `user_id`
    pub async fn cancel(&self, id: u64, user_id: u64) -> Result<Option<Reminder>> {
        let canceled = self
            .store
            .update_if(|file| {
                match file
                    .reminders
                    .iter()
                    .position(|r| r.id == id && r.user_id == user_id)
                {
                    Some(index) => (Some(file.reminders.remove(index)), true),
                    None => (None, false),
                }
            })
            .await?;

        if canceled.is_some() {
            info!(id, user_id, "Reminder canceled");
        }
        Ok(canceled)
    }

    /// Remove and return every reminder due at `now`
    pub async fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        self.store
            .update_if(|file| {
                let (due, pending): (Vec<Reminder>, Vec<Reminder>) = file
                    .reminders
                    .drain(..)
                    .partition(|r| r.is_due(now));
                file.reminders = pending;
                let changed = !due.is_empty();
                (due, changed)
            })
            .await
    }

    pub async fn len(&self) -> usize {
        self.store.read(|file| file.reminders.len()).await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
