//! Persisted token slot.
//!
//! The session survives restarts through a single well-known slot holding
//! the raw token string. The production store is a file under the
//! platform config directory; tests use the in-memory variant.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// A single string-valued slot for the bearer token.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, `None` when the slot is empty.
    fn load(&self) -> Result<Option<String>>;
    /// Write the token, replacing any previous value.
    fn save(&self, token: &str) -> Result<()>;
    /// Empty the slot. Clearing an already-empty slot is not an error.
    fn clear(&self) -> Result<()>;
}

/// File-backed store at `<config_dir>/patent-cli/token`.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default platform location, creating the parent
    /// directory if needed.
    pub fn at_default_path() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| {
                Error::Storage(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "could not determine config directory",
                ))
            })?
            .join("patent-cli");
        fs::create_dir_all(&dir)?;
        Ok(Self::new(dir.join("token")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim().to_string();
                Ok((!token.is_empty()).then_some(token))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(e)),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(e)),
        }
    }
}

impl<S: TokenStore + ?Sized> TokenStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, token: &str) -> Result<()> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// In-memory store for tests and embedded use.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.slot.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}
