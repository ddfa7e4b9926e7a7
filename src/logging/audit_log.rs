// Audit logger
//
// Writes moderation and admin events to <data_dir>/audit/audit_YYYY-MM-DD.jsonl

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// An event worth keeping a durable trail of
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Classifier flagged a message and the ledger was incremented
    OffenseRecorded {
        username: String,
        category: String,
        count: u64,
    },
    /// Ledger and archive wiped before a history rescan
    LedgerCleared { by: u64 },
    /// History rescan finished
    HistoryScanned {
        by: u64,
        messages: usize,
        flagged: usize,
    },
    ChannelAdded { channel_id: u64, by: u64 },
    ChannelRemoved { channel_id: u64, by: u64 },
    NoteRemoved {
        username: String,
        note: String,
        by: u64,
    },
    MemberDeleted { username: String, by: u64 },
    ReminderFired {
        id: u64,
        user_id: u64,
        delivered: bool,
    },
    ReminderCanceled { id: u64, user_id: u64 },
    RoleMenuCreated {
        message_id: u64,
        channel_id: u64,
        by: u64,
    },
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    ts: String,
    #[serde(flatten)]
    event: &'a AuditEvent,
}

/// Writes audit events to a daily JSONL log file
pub struct AuditLogger {
    audit_dir: PathBuf,
}

impl AuditLogger {
    pub fn new(audit_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&audit_dir).with_context(|| {
            format!("Failed to create audit directory: {}", audit_dir.display())
        })?;
        Ok(Self { audit_dir })
    }

    /// Log an event
    pub fn log(&self, event: AuditEvent) -> Result<()> {
        let path = self.today_path();

        let ts = Utc::now().to_rfc3339();
        let entry = LogEntry { ts, event: &event };
        let json = serde_json::to_string(&entry).context("Failed to serialize audit event")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open audit log: {}", path.display()))?;

        writeln!(file, "{}", json).context("Failed to write audit event")?;

        Ok(())
    }

    /// Log an event, downgrading a write failure to a warning
    pub fn record(&self, event: AuditEvent) {
        if let Err(e) = self.log(event) {
            tracing::warn!(error = %e, "Failed to write audit event");
        }
    }

    /// Return the path to today's log file
    pub fn today_path(&self) -> PathBuf {
        let date = Local::now().format("%Y-%m-%d").to_string();
        self.audit_dir.join(format!("audit_{}.jsonl", date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn logger_in_tempdir() -> (AuditLogger, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().join("audit")).unwrap();
        (logger, dir)
    }

    fn read_lines(logger: &AuditLogger) -> Vec<serde_json::Value> {
        let path = logger.today_path();
        if !path.exists() {
            return Vec::new();
        }
        fs::read_to_string(&path)
            .unwrap()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).expect("valid JSON line"))
            .collect()
    }

    #[test]
    fn test_log_creates_file_and_appends() {
        let (logger, _dir) = logger_in_tempdir();
        assert!(!logger.today_path().exists());
        for id in 0..3 {
            logger
                .log(AuditEvent::ReminderCanceled { id, user_id: 9 })
                .unwrap();
        }
        assert_eq!(read_lines(&logger).len(), 3);
    }

    #[test]
    fn test_offense_event_shape() {
        let (logger, _dir) = logger_in_tempdir();
        logger.record(AuditEvent::OffenseRecorded {
            username: "alice".into(),
            category: "harassment".into(),
            count: 2,
        });
        let line = &read_lines(&logger)[0];
        assert_eq!(line["event"], "offense_recorded");
        assert_eq!(line["username"], "alice");
        assert_eq!(line["category"], "harassment");
        assert_eq!(line["count"], 2);
        assert!(line["ts"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_today_path_format() {
        let (logger, dir) = logger_in_tempdir();
        let path = logger.today_path();
        let filename = path.file_name().unwrap().to_str().unwrap();
        assert!(filename.starts_with("audit_"), "got: {}", filename);
        assert!(filename.ends_with(".jsonl"), "got: {}", filename);
        assert_eq!(path.parent().unwrap(), dir.path().join("audit"));
    }
}
