// Offense ledger
//
// Per-user category counters in moderation.json

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

use crate::storage::JsonStore;

/// username → (category → count)
pub type OffenseCounts = BTreeMap<String, BTreeMap<String, u64>>;

pub struct OffenseLedger {
    store: JsonStore<OffenseCounts>,
}

impl OffenseLedger {
    /// Open the ledger, creating an empty file if none exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            store: JsonStore::open(path)?,
        })
    }

    /// Increment `username`'s counter for `category`; returns the new count
    pub async fn record(&self, username: &str, category: &str) -> Result<u64> {
        let count = self
            .store
            .update(|doc| {
                let counter = doc
                    .entry(username.to_string())
                    .or_default()
                    .entry(category.to_string())
                    .or_insert(0);
                *counter += 1;
                *counter
            })
            .await?;

        info!(username, category, count, "Offense recorded");
        Ok(count)
    }

    pub async fn all(&self) -> OffenseCounts {
        self.store.read(|doc| doc.clone()).await
    }

    /// Counters for one user, or `None` when nothing was ever recorded
    pub async fn for_user(&self, username: &str) -> Option<BTreeMap<String, u64>> {
        self.store.read(|doc| doc.get(username).cloned()).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.update(|doc| doc.clear()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_in_tempdir() -> (OffenseLedger, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OffenseLedger::open(dir.path().join("moderation.json")).unwrap();
        (ledger, dir)
    }

    #[tokio::test]
    async fn test_repeated_records_count_exactly() {
        let (ledger, _dir) = ledger_in_tempdir();
        for i in 1..=5 {
            assert_eq!(ledger.record("alice", "harassment").await.unwrap(), i);
        }
        let counts = ledger.for_user("alice").await.unwrap();
        assert_eq!(counts["harassment"], 5);
    }

    #[tokio::test]
    async fn test_unknown_user_is_none_not_zero() {
        let (ledger, _dir) = ledger_in_tempdir();
        assert!(ledger.for_user("nobody").await.is_none());
        assert!(ledger.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_categories_are_independent() {
        let (ledger, _dir) = ledger_in_tempdir();
        ledger.record("bob", "hate").await.unwrap();
        ledger.record("bob", "violence").await.unwrap();
        ledger.record("bob", "hate").await.unwrap();

        let counts = ledger.for_user("bob").await.unwrap();
        assert_eq!(counts["hate"], 2);
        assert_eq!(counts["violence"], 1);
        assert_eq!(counts.len(), 2);
    }

    #[tokio::test]
    async fn test_file_format_matches_legacy_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moderation.json");
        let ledger = OffenseLedger::open(&path).unwrap();
        ledger.record("alice", "harassment").await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "alice": { "harassment": 1 } }));
    }

    #[tokio::test]
    async fn test_clear_empties_ledger() {
        let (ledger, _dir) = ledger_in_tempdir();
        ledger.record("alice", "hate").await.unwrap();
        ledger.clear().await.unwrap();
        assert!(ledger.all().await.is_empty());
    }
}
