use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The one key the client persists.
pub const SESSION_KEY: &str = "guest_session_id";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable storage for the guest session id.
///
/// Calls are synchronous and run inside the reducer on the UI task; the file
/// holds one short id.
pub trait SessionStore: Send {
    fn load(&self) -> Result<Option<String>, StoreError>;

    fn save(&mut self, id: &str) -> Result<(), StoreError>;

    /// Wipes everything the store holds, not just the session key.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Key/value JSON file in the platform data directory.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let map = self.read_map()?;
        Ok(map.get(SESSION_KEY).filter(|id| !id.is_empty()).cloned())
    }

    fn save(&mut self, id: &str) -> Result<(), StoreError> {
        let mut map = self.read_map().unwrap_or_default();
        map.insert(SESSION_KEY.to_string(), id.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write to a sibling file, then rename over the original.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&map)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store used by tests. Clones share the same contents.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    inner: std::sync::Arc<std::sync::Mutex<MemoryContents>>,
}

#[cfg(test)]
#[derive(Debug, Default)]
struct MemoryContents {
    value: Option<String>,
    clears: usize,
}

#[cfg(test)]
impl MemorySessionStore {
    pub fn with_id(id: &str) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().value = Some(id.to_string());
        store
    }

    pub fn value(&self) -> Option<String> {
        self.inner.lock().unwrap().value.clone()
    }

    pub fn clears(&self) -> usize {
        self.inner.lock().unwrap().clears
    }
}

#[cfg(test)]
impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.value())
    }

    fn save(&mut self, id: &str) -> Result<(), StoreError> {
        self.inner.lock().unwrap().value = Some(id.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.value = None;
        inner.clears += 1;
        Ok(())
    }
}
