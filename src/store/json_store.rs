use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::store::StoreError;

const MAX_LEARNER_ID_LEN: usize = 128;

/// Load/save boundary for serialized learner state.
///
/// Absent state is `Ok(None)`. Stores never retry; failures go to the caller.
pub trait StateStore {
    fn load(&self, learner_id: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, learner_id: &str, blob: &str) -> Result<(), StoreError>;
}

/// One JSON file per learner under a base directory.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn from_config(config: &Config) -> Result<Self, StoreError> {
        Self::new(config.data_path().join("learners"))
    }

    pub fn file_path(&self, learner_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self.base_dir.join(format!("{}.json", checked_id(learner_id)?)))
    }
}

/// Ids become file names, so only a conservative character set is accepted.
fn checked_id(learner_id: &str) -> Result<&str, StoreError> {
    let valid = !learner_id.is_empty()
        && learner_id.len() <= MAX_LEARNER_ID_LEN
        && !learner_id.starts_with('.')
        && learner_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if valid {
        Ok(learner_id)
    } else {
        Err(StoreError::InvalidLearnerId(learner_id.to_string()))
    }
}

impl StateStore for JsonStore {
    fn load(&self, learner_id: &str) -> Result<Option<String>, StoreError> {
        let path = self.file_path(learner_id)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, learner_id: &str, blob: &str) -> Result<(), StoreError> {
        let path = self.file_path(learner_id)?;
        let tmp_path = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(blob.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// In-process store for tests and embedding hosts that persist elsewhere.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, learner_id: &str) -> Option<&str> {
        self.blobs.get(learner_id).map(String::as_str)
    }

    pub fn insert(&mut self, learner_id: impl Into<String>, blob: impl Into<String>) {
        self.blobs.insert(learner_id.into(), blob.into());
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, learner_id: &str) -> Result<Option<String>, StoreError> {
        checked_id(learner_id)?;
        Ok(self.blobs.get(learner_id).cloned())
    }

    fn save(&mut self, learner_id: &str, blob: &str) -> Result<(), StoreError> {
        checked_id(learner_id)?;
        self.blobs.insert(learner_id.to_string(), blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_learner_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path()).unwrap();
        assert!(store.load("ada").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::new(dir.path().join("nested")).unwrap();
        store.save("ada", "{\"a\":1}").unwrap();
        store.save("ada", "{\"a\":2}").unwrap();
        assert_eq!(store.load("ada").unwrap().as_deref(), Some("{\"a\":2}"));
        assert!(!dir.path().join("nested").join("ada.json.tmp").exists());
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonStore::new(dir.path()).unwrap();
        for id in ["", "..", "../escape", "a/b", ".hidden", "with space"] {
            assert!(
                matches!(store.save(id, "{}"), Err(StoreError::InvalidLearnerId(_))),
                "{id:?} should be rejected"
            );
        }
        assert!(store.save("learner-7_b@home.org", "{}").is_ok());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.load("ada").unwrap().is_none());
        store.save("ada", "blob").unwrap();
        assert_eq!(store.get("ada"), Some("blob"));
        assert_eq!(store.len(), 1);
        assert!(store.save("a/b", "blob").is_err());
    }
}
