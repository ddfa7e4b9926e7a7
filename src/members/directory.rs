// Member directory
//
// Notes, display names and aliases per canonical username

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::storage::JsonStore;

/// Everything known about one person
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl MemberRecord {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.names.is_empty() && self.aliases.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemberError {
    #[error("'{alias}' already belongs to {owner}")]
    AliasConflict { alias: String, owner: String },

    #[error("'{0}' cannot be an alias of itself")]
    SelfAlias(String),

    #[error("'{0}' is already a username with its own record")]
    IsCanonical(String),
}

type MemberDoc = BTreeMap<String, MemberRecord>;

pub struct MemberDirectory {
    store: JsonStore<MemberDoc>,
}

impl MemberDirectory {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            store: JsonStore::open(path)?,
        })
    }

    /// Canonical username for `username`: itself if it is a record key, the
    /// owning key if it is an alias, otherwise unchanged.
    pub async fn resolve(&self, username: &str) -> String {
        self.store.read(|doc| resolve_in(doc, username)).await
    }

    pub async fn add_note(&self, username: &str, note: &str) -> Result<String> {
        let canonical = self
            .store
            .update(|doc| {
                let canonical = resolve_in(doc, username);
                doc.entry(canonical.clone())
                    .or_default()
                    .notes
                    .push(note.to_string());
                canonical
            })
            .await?;
        info!(username = %canonical, "Note added");
        Ok(canonical)
    }

    /// Add a display name. Returns false if the name was already recorded.
    pub async fn add_name(&self, username: &str, name: &str) -> Result<bool> {
        let added = self
            .store
            .update_if(|doc| {
                let canonical = resolve_in(doc, username);
                if doc
                    .get(&canonical)
                    .is_some_and(|r| r.names.iter().any(|n| n == name))
                {
                    return (false, false);
                }
                doc.entry(canonical).or_default().names.push(name.to_string());
                (true, true)
            })
            .await?;
        if added {
            info!(username, name, "Name added");
        }
        Ok(added)
    }

    /// Link `alias` to `username`'s canonical record.
    ///
    /// Returns `Ok(false)` when the alias is already linked to that record,
    /// and an error when it belongs to someone else or is the canonical name
    /// itself.
    pub async fn add_alias(&self, username: &str, alias: &str) -> Result<Result<bool, MemberError>> {
        let outcome = self
            .store
            .update_if(|doc| {
                let canonical = resolve_in(doc, username);
                if canonical == alias {
                    return (Err(MemberError::SelfAlias(alias.to_string())), false);
                }
                if doc.contains_key(alias) {
                    return (Err(MemberError::IsCanonical(alias.to_string())), false);
                }
                match alias_owner(doc, alias).map(str::to_string) {
                    Some(owner) if owner == canonical => (Ok(false), false),
                    Some(owner) => {
                        let conflict = MemberError::AliasConflict {
                            alias: alias.to_string(),
                            owner,
                        };
                        (Err(conflict), false)
                    }
                    None => {
                        doc.entry(canonical).or_default().aliases.push(alias.to_string());
                        (Ok(true), true)
                    }
                }
            })
            .await?;
        if outcome == Ok(true) {
            info!(username, alias, "Alias added");
        }
        Ok(outcome)
    }

    /// Remove a note by its 1-based position. `None` (and no change) for an
    /// unknown user or an index outside `1..=notes.len()`.
    pub async fn remove_note(&self, username: &str, index: usize) -> Result<Option<String>> {
        self.store
            .update_if(|doc| {
                let canonical = resolve_in(doc, username);
                match doc.get_mut(&canonical) {
                    Some(record) if index >= 1 && index <= record.notes.len() => {
                        (Some(record.notes.remove(index - 1)), true)
                    }
                    _ => (None, false),
                }
            })
            .await
    }

    /// Delete the whole canonical record; returns its key and what was removed
    pub async fn delete_user(&self, username: &str) -> Result<Option<(String, MemberRecord)>> {
        let removed = self
            .store
            .update_if(|doc| {
                let canonical = resolve_in(doc, username);
                match doc.remove(&canonical) {
                    Some(record) => (Some((canonical, record)), true),
                    None => (None, false),
                }
            })
            .await?;
        if let Some((canonical, _)) = &removed {
            info!(username = %canonical, "Member record deleted");
        }
        Ok(removed)
    }

    /// Record for `username` (resolving aliases), or an empty default
    pub async fn get(&self, username: &str) -> MemberRecord {
        self.store
            .read(|doc| {
                let canonical = resolve_in(doc, username);
                doc.get(&canonical).cloned().unwrap_or_default()
            })
            .await
    }

    pub async fn usernames(&self) -> Vec<String> {
        self.store.read(|doc| doc.keys().cloned().collect()).await
    }
}

fn alias_owner<'a>(doc: &'a MemberDoc, alias: &str) -> Option<&'a str> {
    doc.iter()
        .find(|(_, record)| record.aliases.iter().any(|a| a == alias))
        .map(|(key, _)| key.as_str())
}

fn resolve_in(doc: &MemberDoc, username: &str) -> String {
    if doc.contains_key(username) {
        return username.to_string();
    }
    alias_owner(doc, username)
        .unwrap_or(username)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory_in_tempdir() -> (MemberDirectory, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let directory = MemberDirectory::open(dir.path().join("members.json")).unwrap();
        (directory, dir)
    }

    #[tokio::test]
    async fn test_resolve_unknown_is_identity() {
        let (members, _dir) = directory_in_tempdir();
        assert_eq!(members.resolve("ghost").await, "ghost");
    }

    #[tokio::test]
    async fn test_note_on_alias_lands_on_canonical() {
        let (members, _dir) = directory_in_tempdir();
        members.add_note("alice", "first").await.unwrap();
        assert_eq!(members.add_alias("alice", "alice_alt").await.unwrap(), Ok(true));

        let canonical = members.add_note("alice_alt", "via alias").await.unwrap();
        assert_eq!(canonical, "alice");

        assert_eq!(members.get("alice").await.notes, vec!["first", "via alias"]);
        assert_eq!(members.usernames().await, vec!["alice"]);
    }

    #[tokio::test]
    async fn test_add_name_dedups() {
        let (members, _dir) = directory_in_tempdir();
        assert!(members.add_name("bob", "Robert").await.unwrap());
        assert!(!members.add_name("bob", "Robert").await.unwrap());
        assert!(members.add_name("bob", "Bobby").await.unwrap());
        assert_eq!(members.get("bob").await.names, vec!["Robert", "Bobby"]);
    }

    #[tokio::test]
    async fn test_alias_rules() {
        let (members, _dir) = directory_in_tempdir();
        members.add_name("alice", "Alice").await.unwrap();
        members.add_name("bob", "Bob").await.unwrap();

        assert_eq!(members.add_alias("alice", "ally").await.unwrap(), Ok(true));
        assert_eq!(members.add_alias("alice", "ally").await.unwrap(), Ok(false));
        // Adding through the alias resolves to the same record
        assert_eq!(members.add_alias("ally", "ally").await.unwrap(), Ok(false));

        assert!(matches!(
            members.add_alias("bob", "ally").await.unwrap(),
            Err(MemberError::AliasConflict { .. })
        ));
        let taken = members.add_alias("bob", "alice").await.unwrap();
        assert_eq!(taken, Err(MemberError::IsCanonical("alice".into())));
        assert_eq!(
            taken.unwrap_err().to_string(),
            "'alice' is already a username with its own record"
        );
        assert_eq!(
            members.add_alias("bob", "bob").await.unwrap(),
            Err(MemberError::SelfAlias("bob".into()))
        );
    }

    #[tokio::test]
    async fn test_remove_note_is_one_based() {
        let (members, _dir) = directory_in_tempdir();
        for note in ["a", "b", "c"] {
            members.add_note("carol", note).await.unwrap();
        }
        assert_eq!(members.remove_note("carol", 2).await.unwrap().as_deref(), Some("b"));
        assert_eq!(members.get("carol").await.notes, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_remove_note_out_of_range_is_noop() {
        let (members, _dir) = directory_in_tempdir();
        members.add_note("dave", "only").await.unwrap();

        assert!(members.remove_note("dave", 0).await.unwrap().is_none());
        assert!(members.remove_note("dave", 2).await.unwrap().is_none());
        assert!(members.remove_note("nobody", 1).await.unwrap().is_none());
        assert_eq!(members.get("dave").await.notes, vec!["only"]);
    }

    #[tokio::test]
    async fn test_delete_user_removes_everything() {
        let (members, _dir) = directory_in_tempdir();
        members.add_note("erin", "note").await.unwrap();
        members.add_name("erin", "Erin").await.unwrap();
        members.add_alias("erin", "erin2").await.unwrap().unwrap();

        let (canonical, snapshot) = members.delete_user("erin2").await.unwrap().unwrap();
        assert_eq!(canonical, "erin");
        assert_eq!(snapshot.notes, vec!["note"]);
        assert_eq!(snapshot.aliases, vec!["erin2"]);

        assert!(members.get("erin").await.is_empty());
        assert!(members.get("erin2").await.is_empty());
        assert_eq!(members.resolve("erin2").await, "erin2");
        assert!(members.delete_user("erin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_legacy_file_without_aliases_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("members.json");
        std::fs::write(&path, r#"{ "frank": { "notes": ["n"], "names": [] } }"#).unwrap();

        let members = MemberDirectory::open(&path).unwrap();
        let record = members.get("frank").await;
        assert_eq!(record.notes, vec!["n"]);
        assert!(record.aliases.is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("members.json");
        {
            let members = MemberDirectory::open(&path).unwrap();
            members.add_alias("gina", "gg").await.unwrap().unwrap();
        }
        let members = MemberDirectory::open(&path).unwrap();
        assert_eq!(members.resolve("gg").await, "gina");
    }
}
