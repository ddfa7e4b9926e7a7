// Role menu store
//
// Menu message id to {emoji -> role}

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::storage::JsonStore;

static CUSTOM_EMOJI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<a?:[A-Za-z0-9_]+:(\d+)>$").expect("valid custom emoji regex"));
static ROLE_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:<@&(\d+)>|(\d+))$").expect("valid role mention regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMenuEntry {
    pub emoji: String,
    pub role_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMenu {
    pub guild_id: u64,
    pub channel_id: u64,
    pub title: String,
    #[serde(default)]
    pub entries: Vec<RoleMenuEntry>,
}

impl RoleMenu {
    /// Role bound to a reaction, matching custom emoji by id
    pub fn role_for(&self, emoji: &str) -> Option<u64> {
        let key = emoji_key(emoji);
        self.entries
            .iter()
            .find(|entry| emoji_key(&entry.emoji) == key)
            .map(|entry| entry.role_id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleMenuError {
    #[error("Give at least one emoji and role pair, e.g. `!rolemenu \"Colours\" 🔴 @Red 🔵 @Blue`")]
    Empty,

    #[error("Emoji and roles must come in pairs; `{0}` has no role")]
    Unpaired(String),

    #[error("`{0}` is not a role mention or role id")]
    InvalidRole(String),

    #[error("{0} is used twice in the same menu")]
    DuplicateEmoji(String),
}

/// Parse whitespace-separated `<emoji> <role>` pairs. Roles may be mentions
/// (`<@&id>`) or bare ids.
pub fn parse_menu_args(args: &str) -> Result<Vec<RoleMenuEntry>, RoleMenuError> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(RoleMenuError::Empty);
    }

    let mut entries: Vec<RoleMenuEntry> = Vec::new();
    for pair in tokens.chunks(2) {
        let emoji = pair[0];
        let role = pair
            .get(1)
            .ok_or_else(|| RoleMenuError::Unpaired(emoji.to_string()))?;

        let role_id = parse_role(role).ok_or_else(|| RoleMenuError::InvalidRole(role.to_string()))?;
        if entries.iter().any(|e| emoji_key(&e.emoji) == emoji_key(emoji)) {
            return Err(RoleMenuError::DuplicateEmoji(emoji.to_string()));
        }

        entries.push(RoleMenuEntry {
            emoji: emoji.to_string(),
            role_id,
        });
    }
    Ok(entries)
}

fn parse_role(token: &str) -> Option<u64> {
    let caps = ROLE_MENTION.captures(token)?;
    caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok()
}

/// Custom emoji compare by id (names can change); unicode compares as-is
pub fn emoji_key(emoji: &str) -> String {
    let emoji = emoji.trim();
    match CUSTOM_EMOJI.captures(emoji) {
        Some(caps) => caps[1].to_string(),
        None => emoji.to_string(),
    }
}

pub struct RoleMenuStore {
    store: JsonStore<BTreeMap<String, RoleMenu>>,
}

impl RoleMenuStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            store: JsonStore::open(path)?,
        })
    }

    pub async fn insert(&self, message_id: u64, menu: RoleMenu) -> Result<()> {
        let entries = menu.entries.len();
        self.store
            .update(|menus| {
                menus.insert(message_id.to_string(), menu);
            })
            .await?;
        info!(message_id, entries, "Role menu saved");
        Ok(())
    }

    /// Role for a reaction on a menu message, if that message is a menu
    pub async fn role_for(&self, message_id: u64, emoji: &str) -> Option<u64> {
        self.store
            .read(|menus| menus.get(&message_id.to_string())?.role_for(emoji))
            .await
    }

    pub async fn remove(&self, message_id: u64) -> Result<Option<RoleMenu>> {
        self.store
            .update_if(|menus| match menus.remove(&message_id.to_string()) {
                Some(menu) => (Some(menu), true),
                None => (None, false),
            })
            .await
    }

    pub async fn len(&self) -> usize {
        self.store.read(|menus| menus.len()).await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(entries: Vec<RoleMenuEntry>) -> RoleMenu {
        RoleMenu {
            guild_id: 1,
            channel_id: 2,
            title: "Colours".into(),
            entries,
        }
    }

    #[test]
    fn test_parse_pairs_mentions_and_ids() {
        let entries = parse_menu_args("🔴 <@&111> <:blue:222> 333").unwrap();
        assert_eq!(
            entries,
            vec![
                RoleMenuEntry { emoji: "🔴".into(), role_id: 111 },
                RoleMenuEntry { emoji: "<:blue:222>".into(), role_id: 333 },
            ]
        );
    }

    #[test]
    fn test_parse_rejects_bad_args() {
        assert_eq!(parse_menu_args("   "), Err(RoleMenuError::Empty));
        assert_eq!(
            parse_menu_args("🔴 <@&1> 🔵"),
            Err(RoleMenuError::Unpaired("🔵".into()))
        );
        assert_eq!(
            parse_menu_args("🔴 @Red"),
            Err(RoleMenuError::InvalidRole("@Red".into()))
        );
        assert_eq!(
            parse_menu_args("🔴 1 🔴 2"),
            Err(RoleMenuError::DuplicateEmoji("🔴".into()))
        );
    }

    #[test]
    fn test_custom_emoji_matches_by_id() {
        let m = menu(vec![RoleMenuEntry { emoji: "<:blue:222>".into(), role_id: 9 }]);
        assert_eq!(m.role_for("<:renamed:222>"), Some(9));
        assert_eq!(m.role_for("<a:blue:222>"), Some(9));
        assert_eq!(m.role_for("222"), Some(9));
        assert_eq!(m.role_for("🔵"), None);
    }

    #[tokio::test]
    async fn test_store_lookup_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("role_menus.json");
        {
            let store = RoleMenuStore::open(&path).unwrap();
            store
                .insert(500, menu(vec![RoleMenuEntry { emoji: "🔴".into(), role_id: 7 }]))
                .await
                .unwrap();
        }

        let store = RoleMenuStore::open(&path).unwrap();
        assert_eq!(store.role_for(500, "🔴").await, Some(7));
        assert_eq!(store.role_for(500, "🟢").await, None);
        assert_eq!(store.role_for(501, "🔴").await, None);

        assert!(store.remove(500).await.unwrap().is_some());
        assert!(store.remove(500).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }
}
