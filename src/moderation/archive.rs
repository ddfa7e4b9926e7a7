// Offense message archive
//
// The most recent flagged messages per user

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::constants::{MAX_ARCHIVED_CONTENT_CHARS, MAX_ARCHIVED_OFFENSES};
use crate::storage::JsonStore;

const TRUNCATION_MARKER: &str = "... [truncated]";

/// One flagged message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedOffense {
    #[serde(with = "crate::storage::timestamp")]
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub content: String,
}

type ArchiveDoc = BTreeMap<String, Vec<ArchivedOffense>>;

pub struct OffenseArchive {
    store: JsonStore<ArchiveDoc>,
}

impl OffenseArchive {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            store: JsonStore::open(path)?,
        })
    }

    /// Append a flagged message, keeping only the newest entries per user
    pub async fn record(
        &self,
        username: &str,
        category: &str,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let entry = ArchivedOffense {
            timestamp,
            category: category.to_string(),
            content: truncate_content(content),
        };

        self.store
            .update(|doc| {
                let entries = doc.entry(username.to_string()).or_default();
                entries.push(entry);
                entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                entries.truncate(MAX_ARCHIVED_OFFENSES);
            })
            .await
    }

    /// Newest-first flagged messages for `username`, at most `limit`
    pub async fn recent(&self, username: &str, limit: usize) -> Vec<ArchivedOffense> {
        self.store
            .read(|doc| {
                doc.get(username)
                    .map(|entries| entries.iter().take(limit).cloned().collect())
                    .unwrap_or_default()
            })
            .await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.update(|doc| doc.clear()).await
    }
}

/// Cut `content` to at most `MAX_ARCHIVED_CONTENT_CHARS` characters,
/// marker included.
pub fn truncate_content(content: &str) -> String {
    if content.chars().count() <= MAX_ARCHIVED_CONTENT_CHARS {
        return content.to_string();
    }
    let keep = MAX_ARCHIVED_CONTENT_CHARS - TRUNCATION_MARKER.chars().count();
    let mut truncated: String = content.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn archive_in_tempdir() -> (OffenseArchive, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let archive = OffenseArchive::open(dir.path().join("offense_messages.json")).unwrap();
        (archive, dir)
    }

    #[test]
    fn test_short_content_untouched() {
        assert_eq!(truncate_content("hello"), "hello");
        let exact = "x".repeat(MAX_ARCHIVED_CONTENT_CHARS);
        assert_eq!(truncate_content(&exact), exact);
    }

    #[test]
    fn test_long_content_truncated_with_marker() {
        let long = "y".repeat(MAX_ARCHIVED_CONTENT_CHARS + 1);
        let cut = truncate_content(&long);
        assert_eq!(cut.chars().count(), MAX_ARCHIVED_CONTENT_CHARS);
        assert!(cut.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let long = "é".repeat(MAX_ARCHIVED_CONTENT_CHARS + 10);
        let cut = truncate_content(&long);
        assert_eq!(cut.chars().count(), MAX_ARCHIVED_CONTENT_CHARS);
    }

    #[tokio::test]
    async fn test_keeps_twenty_most_recent_newest_first() {
        let (archive, _dir) = archive_in_tempdir();
        let base = Utc::now();

        for i in 0..25 {
            archive
                .record(
                    "alice",
                    "hate",
                    &format!("message {}", i),
                    base + Duration::seconds(i),
                )
                .await
                .unwrap();
        }

        let entries = archive.recent("alice", 100).await;
        assert_eq!(entries.len(), MAX_ARCHIVED_OFFENSES);
        assert_eq!(entries[0].content, "message 24");
        assert_eq!(entries[19].content, "message 5");
        assert!(entries
            .windows(2)
            .all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_out_of_order_insert_drops_oldest() {
        let (archive, _dir) = archive_in_tempdir();
        let base = Utc::now();

        for i in 1..=20 {
            archive
                .record("bob", "spam", &format!("m{}", i), base + Duration::seconds(i))
                .await
                .unwrap();
        }
        // Older than everything retained: sorted to the end and dropped
        archive
            .record("bob", "spam", "ancient", base - Duration::days(1))
            .await
            .unwrap();

        let entries = archive.recent("bob", 100).await;
        assert_eq!(entries.len(), 20);
        assert!(entries.iter().all(|e| e.content != "ancient"));
    }

    #[tokio::test]
    async fn test_legacy_naive_timestamps_survive_a_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offense_messages.json");
        std::fs::write(
            &path,
            r#"{"bob": [{"timestamp": "2024-05-01T09:30:00.123456", "category": "spam", "content": "buy now"}]}"#,
        )
        .unwrap();

        let archive = OffenseArchive::open(&path).unwrap();
        let bob = archive.recent("bob", 20).await;
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].content, "buy now");

        archive.record("alice", "hate", "x", Utc::now()).await.unwrap();
        drop(archive);

        let reopened = OffenseArchive::open(&path).unwrap();
        assert_eq!(reopened.recent("bob", 20).await, bob);
        assert_eq!(reopened.recent("alice", 20).await.len(), 1);
    }

    #[tokio::test]
    async fn test_recent_respects_limit_and_unknown_user() {
        let (archive, _dir) = archive_in_tempdir();
        let now = Utc::now();
        archive.record("carol", "hate", "a", now).await.unwrap();
        archive
            .record("carol", "hate", "b", now + Duration::seconds(1))
            .await
            .unwrap();

        let one = archive.recent("carol", 1).await;
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].content, "b");
        assert!(archive.recent("nobody", 5).await.is_empty());
    }
}
