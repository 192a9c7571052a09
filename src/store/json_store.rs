use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::store::kv::{KeyValueStore, StoreError};

/// One pretty-printed JSON file per key under the data directory.
#[derive(Clone, Debug)]
pub struct JsonStore {
    base_dir: PathBuf,
}

fn io_err(key: &str) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        key: key.to_string(),
        source,
    }
}

fn write_synced(path: &Path, content: &str) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

impl JsonStore {
    pub fn new() -> anyhow::Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kanadr");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    /// Write several keys as one unit: stage every value to `.tmp`, then swap
    /// each into place keeping a `.bak` of the old file. Any failure restores
    /// the previous files.
    pub fn set_all(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        let mut staged: Vec<PathBuf> = Vec::new();
        for (key, json) in entries {
            let tmp_path = self.file_path(key).with_extension("json.tmp");
            if let Err(source) = write_synced(&tmp_path, json) {
                for tmp in &staged {
                    let _ = fs::remove_file(tmp);
                }
                let _ = fs::remove_file(&tmp_path);
                return Err(io_err(key)(source));
            }
            staged.push(tmp_path);
        }

        // (final, backup, had_original)
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        let rollback = |committed: &[(PathBuf, PathBuf, bool)]| {
            for (final_path, bak_path, had_original) in committed {
                if *had_original {
                    let _ = fs::rename(bak_path, final_path);
                } else {
                    let _ = fs::remove_file(final_path);
                }
            }
        };

        for (i, (key, _)) in entries.iter().enumerate() {
            let final_path = self.file_path(key);
            let bak_path = final_path.with_extension("json.bak");
            let had_original = final_path.exists();

            if had_original && let Err(source) = fs::rename(&final_path, &bak_path) {
                rollback(&committed);
                for tmp in &staged {
                    let _ = fs::remove_file(tmp);
                }
                return Err(io_err(key)(source));
            }

            if let Err(source) = fs::rename(&staged[i], &final_path) {
                if had_original {
                    let _ = fs::rename(&bak_path, &final_path);
                }
                rollback(&committed);
                for tmp in &staged[i..] {
                    let _ = fs::remove_file(tmp);
                }
                return Err(io_err(key)(source));
            }

            committed.push((final_path, bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }
        Ok(())
    }

    /// Remove `.bak` files left behind by an interrupted [`JsonStore::set_all`].
    /// Returns whether any were found.
    pub fn recover_interrupted_writes(&self) -> bool {
        let Ok(dir) = fs::read_dir(&self.base_dir) else {
            return false;
        };
        let mut found = false;
        for entry in dir.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.to_string_lossy().ends_with(".json.bak") {
                found = true;
                tracing::warn!(path = %path.display(), "removing leftover backup file");
                let _ = fs::remove_file(&path);
            }
        }
        found
    }
}

impl KeyValueStore for JsonStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.file_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path).map(Some).map_err(io_err(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.file_path(key);
        let tmp_path = path.with_extension("json.tmp");
        write_synced(&tmp_path, value).map_err(io_err(key))?;
        fs::rename(&tmp_path, &path).map_err(io_err(key))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_err(key)(err)),
        }
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        self.set_all(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_set_get_remove() {
        let (_dir, mut store) = make_test_store();
        assert_eq!(store.get("stats").unwrap(), None);
        store.set("stats", "{}").unwrap();
        assert_eq!(store.get("stats").unwrap().as_deref(), Some("{}"));
        assert!(store.base_dir().join("stats.json").exists());
        store.remove("stats").unwrap();
        store.remove("stats").unwrap();
        assert_eq!(store.get("stats").unwrap(), None);
    }

    #[test]
    fn test_set_leaves_no_tmp_file() {
        let (dir, mut store) = make_test_store();
        store.set("map", r#"{"KeyT":"か"}"#).unwrap();
        let tmp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(tmp_files.is_empty());
    }

    #[test]
    fn test_set_all_replaces_every_key() {
        let (_dir, mut store) = make_test_store();
        store.set("map", "old").unwrap();
        store
            .set_all(&[("map", "new".to_string()), ("word_sets", "[]".to_string())])
            .unwrap();
        assert_eq!(store.get("map").unwrap().as_deref(), Some("new"));
        assert_eq!(store.get("word_sets").unwrap().as_deref(), Some("[]"));
        assert!(!store.recover_interrupted_writes());
    }

    #[test]
    fn test_set_all_staging_failure_preserves_originals() {
        let (dir, mut store) = make_test_store();
        store.set("map", "original").unwrap();

        let mut bad_store = JsonStore {
            base_dir: dir.path().join("nonexistent_subdir"),
        };
        let result = bad_store.set_all(&[("map", "new".to_string())]);
        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(store.get("map").unwrap().as_deref(), Some("original"));
    }

    #[test]
    fn test_recover_interrupted_writes() {
        let (_dir, store) = make_test_store();
        assert!(!store.recover_interrupted_writes());
        fs::write(store.base_dir().join("map.json.bak"), "{}").unwrap();
        assert!(store.recover_interrupted_writes());
        assert!(!store.base_dir().join("map.json.bak").exists());
    }
}
