use crate::error::StoreError;
use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Durable string storage addressed by a namespace key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per entry inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_location() -> Result<Self, StoreError> {
        let proj_dirs =
            ProjectDirs::from("com", "ppt-helper", "ppt-helper").ok_or(StoreError::NoStorageDir)?;
        Ok(Self::new(proj_dirs.data_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }

    fn write_secure_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = file.metadata()?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");
        Self::write_secure_file(&tmp, value.as_bytes())?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("unitutor-settings").expect("get"), None);
        store.set("unitutor-settings", "{\"a\":1}").expect("set");
        assert_eq!(
            store.get("unitutor-settings").expect("get").as_deref(),
            Some("{\"a\":1}")
        );

        store.set("unitutor-settings", "{\"a\":2}").expect("overwrite");
        assert_eq!(
            store.get("unitutor-settings").expect("get").as_deref(),
            Some("{\"a\":2}")
        );
    }

    #[cfg(unix)]
    #[test]
    fn file_store_writes_owner_only_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::new(dir.path());
        store.set("secret", "value").expect("set");

        let mode = fs::metadata(store.entry_path("secret"))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn entry_path_sanitizes_key() {
        let store = FileStore::new("/tmp/x");
        assert_eq!(store.entry_path("a/b c"), PathBuf::from("/tmp/x/a_b_c.json"));
    }
}
