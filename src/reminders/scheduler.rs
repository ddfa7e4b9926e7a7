// Reminder scheduler loop

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::queue::{Reminder, ReminderQueue};
use crate::logging::{AuditEvent, AuditLogger};

/// Where fired reminders go
#[async_trait]
pub trait ReminderSink: Send + Sync {
    async fn deliver(&self, reminder: &Reminder) -> Result<()>;
}

/// Fires due reminders on a fixed interval
pub struct ReminderScheduler {
    queue: Arc<ReminderQueue>,
    sink: Arc<dyn ReminderSink>,
    interval: Duration,
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
    audit: Option<Arc<AuditLogger>>,
}

impl ReminderScheduler {
    pub fn new(queue: Arc<ReminderQueue>, sink: Arc<dyn ReminderSink>, interval: Duration) -> Self {
        Self {
            queue,
            sink,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// One sweep: deliver everything due at `now`. Returns how many fired.
    ///
    /// Due reminders are removed before delivery, so a failed delivery is
    /// logged and dropped.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<usize> {
        let due = self.queue.take_due(now).await?;
        if due.is_empty() {
            return Ok(0);
        }

        info!(count = due.len(), "Firing reminders");
        for reminder in &due {
            let delivered = match self.sink.deliver(reminder).await {
                Ok(()) => {
                    debug!(id = reminder.id, user_id = reminder.user_id, "Reminder delivered");
                    true
                }
                Err(e) => {
                    warn!(id = reminder.id, user_id = reminder.user_id, error = %e, "Reminder delivery failed");
                    false
                }
            };

            if let Some(audit) = &self.audit {
                audit.record(AuditEvent::ReminderFired {
                    id: reminder.id,
                    user_id: reminder.user_id,
                    delivered,
                });
            }
        }

        Ok(due.len())
    }

    /// Run until `stop()` is called. Returns at once if it already was.
    pub async fn run(&self) {
        if self.stop_requested.load(Ordering::SeqCst) {
            debug!("Reminder scheduler stopped before it started");
            return;
        }
        self.running.store(true, Ordering::SeqCst);
        info!(interval_secs = self.interval.as_secs(), "Reminder scheduler started");

        while !self.stop_requested.load(Ordering::SeqCst) {
            tokio::time::sleep(self.interval).await;
            if self.stop_requested.load(Ordering::SeqCst) {
                break;
            }

            if let Err(e) = self.tick(Utc::now()).await {
                error!(error = %e, "Reminder sweep failed");
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Reminder scheduler stopped");
    }

    /// Stop the loop. Sticky: a later `run()` returns immediately.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
