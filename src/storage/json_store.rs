// JSON document store
//
// One JSON document per file. The document is loaded once at open and kept in
// memory behind an async mutex; every mutation writes the whole document back
// while the lock is still held, via a sibling temp file and a rename.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

pub struct JsonStore<T> {
    path: PathBuf,
    doc: Mutex<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send,
{
    /// Open the store at `path`.
    ///
    /// A missing file is created with the default document. A malformed file
    /// is renamed to `<name>.corrupt-<timestamp>` and the store starts from the
    /// default document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let doc = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if contents.trim().is_empty() {
                T::default()
            } else {
                match serde_json::from_str(&contents) {
                    Ok(doc) => doc,
                    Err(e) => {
                        let backup = quarantine(&path)?;
                        error!(
                            path = %path.display(),
                            backup = %backup.display(),
                            error = %e,
                            "Malformed store file moved aside, starting empty"
                        );
                        let doc = T::default();
                        write_atomic(&path, &doc)?;
                        doc
                    }
                }
            }
        } else {
            let doc = T::default();
            write_atomic(&path, &doc)?;
            info!(path = %path.display(), "Created store file");
            doc
        };

        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the current document
    pub async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let doc = self.doc.lock().await;
        f(&doc)
    }

    /// Run `f` against the document and persist the result.
    ///
    /// If the write fails the in-memory document is restored to its previous
    /// state and the error is returned.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        self.update_if(|doc| (f(doc), true)).await
    }

    /// Like `update`, but `f` reports whether it changed anything and the
    /// document is only written when it did. `f` must leave the document
    /// untouched when it returns `false`.
    pub async fn update_if<R>(&self, f: impl FnOnce(&mut T) -> (R, bool)) -> Result<R> {
        let mut doc = self.doc.lock().await;
        let before = doc.clone();
        let (result, changed) = f(&mut doc);
        if !changed {
            return Ok(result);
        }

        if let Err(e) = write_atomic(&self.path, &*doc) {
            *doc = before;
            return Err(e);
        }

        debug!(path = %self.path.display(), "Store persisted");
        Ok(result)
    }
}

/// Move an unreadable store file out of the way so it can be recovered by hand
fn quarantine(path: &Path) -> Result<PathBuf> {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".corrupt-{}", Utc::now().format("%Y%m%d%H%M%S")));
    let backup = PathBuf::from(name);
    fs::rename(path, &backup)
        .with_context(|| format!("Failed to move malformed {} aside", path.display()))?;
    Ok(backup)
}

fn write_atomic<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(doc).context("Failed to serialize store")?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, json)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type Doc = BTreeMap<String, u32>;

    #[tokio::test]
    async fn test_open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("doc.json");

        let store: JsonStore<Doc> = JsonStore::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.read(|d| d.is_empty()).await);
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[tokio::test]
    async fn test_update_persists_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let store: JsonStore<Doc> = JsonStore::open(&path).unwrap();
        store
            .update(|d| {
                d.insert("a".into(), 1);
            })
            .await
            .unwrap();
        drop(store);

        let reopened: JsonStore<Doc> = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.read(|d| d.get("a").copied()).await, Some(1));
        assert!(!dir.path().join("doc.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_update_if_skips_write_when_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let store: JsonStore<Doc> = JsonStore::open(&path).unwrap();

        fs::write(&path, "sentinel").unwrap();
        let seen = store.update_if(|d| (d.len(), false)).await.unwrap();
        assert_eq!(seen, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "sentinel");

        store
            .update_if(|d| {
                d.insert("k".into(), 3);
                ((), true)
            })
            .await
            .unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("\"k\": 3"));
    }

    fn corrupt_backups(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("doc.json.corrupt-"))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{ not json").unwrap();

        let store: JsonStore<Doc> = JsonStore::open(&path).unwrap();
        assert!(store.read(|d| d.is_empty()).await);

        store
            .update(|d| {
                d.insert("fresh".into(), 1);
            })
            .await
            .unwrap();

        // The unreadable contents are kept next to the new file
        let backups = corrupt_backups(dir.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "{ not json");
        assert!(fs::read_to_string(&path).unwrap().contains("\"fresh\": 1"));
    }

    #[tokio::test]
    async fn test_empty_file_is_not_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "  \n").unwrap();

        let store: JsonStore<Doc> = JsonStore::open(&path).unwrap();
        assert!(store.read(|d| d.is_empty()).await);
        assert!(corrupt_backups(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let store: JsonStore<Doc> = JsonStore::open(&path).unwrap();

        // Replace the target with a non-empty directory so the rename fails
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("blocker"), "x").unwrap();

        let result = store
            .update(|d| {
                d.insert("lost".into(), 1);
            })
            .await;
        assert!(result.is_err());
        assert!(store.read(|d| d.is_empty()).await);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store: std::sync::Arc<JsonStore<Doc>> =
            std::sync::Arc::new(JsonStore::open(dir.path().join("doc.json")).unwrap());

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(|d| *d.entry("n".into()).or_insert(0) += 1)
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.read(|d| d["n"]).await, 20);
    }
}
