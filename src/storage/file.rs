// File-backed key-value store.
// One file per key, written atomically via temp file then rename.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::{PosError, Result};

use super::KeyValueStore;

/// Key-value store persisting each entry as a file under a base directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open a store in the platform data directory
    /// (~/.local/share/posadmin on Linux).
    pub fn open_default() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "posadmin")
            .ok_or_else(|| PosError::Storage("no home directory available".into()))?;
        Ok(Self::new(dirs.data_dir()))
    }

    /// Base directory of this store.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.entry_path(key);
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Sanitize a key for use as a file name.
/// Replaces problematic characters with underscores.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.set("products", r#"[{"id":"1"}]"#).unwrap();
        let read = store.get("products").unwrap();
        assert_eq!(read, Some(r#"[{"id":"1"}]"#.to_string()));
    }

    #[test]
    fn test_get_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        assert_eq!(store.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.set("sales", "[]").unwrap();
        store.set("sales", r#"["s1"]"#).unwrap();
        assert_eq!(store.get("sales").unwrap(), Some(r#"["s1"]"#.to_string()));
    }

    #[test]
    fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.set("products_needs_sync", "true").unwrap();
        store.remove("products_needs_sync").unwrap();
        assert_eq!(store.get("products_needs_sync").unwrap(), None);

        // Removing a missing key is fine
        store.remove("products_needs_sync").unwrap();
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("products"), "products");
        assert_eq!(sanitize_key("branch/1:sales"), "branch_1_sales");
    }

    #[test]
    fn test_keys_with_path_chars_stay_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.set("a/b", "v").unwrap();
        assert!(temp_dir.path().join("a_b.json").exists());
    }
}
