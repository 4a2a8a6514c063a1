//! # valvebridge-adapter-cache-json
//!
//! Accessory cache adapter — persists accessory identities as a JSON file.
//!
//! The host framework's accessory cache is modeled as a flat file: every
//! identity registered during discovery is upserted by UUID and written
//! back; on startup the whole file is replayed as restore events.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `valvebridge-app` and
//! `valvebridge-domain`.

use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use valvebridge_app::ports::AccessoryRegistry;
use valvebridge_domain::accessory::AccessoryIdentity;
use valvebridge_domain::error::BridgeError;

/// Cache adapter errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("cache file IO error")]
    Io(#[from] io::Error),

    /// The cache file holds malformed JSON.
    #[error("cache file is not valid JSON")]
    Malformed(#[from] serde_json::Error),
}

impl From<CacheError> for BridgeError {
    fn from(err: CacheError) -> Self {
        BridgeError::cache(err)
    }
}

/// JSON-file-backed accessory registry.
pub struct JsonAccessoryCache {
    path: PathBuf,
    entries: Mutex<Vec<AccessoryIdentity>>,
}

impl JsonAccessoryCache {
    /// Open the cache at `path`, loading existing entries.
    ///
    /// A missing file is an empty cache, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the file exists but cannot be read,
    /// or [`CacheError::Malformed`] when it holds invalid JSON.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(CacheError::Io(err)),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &[AccessoryIdentity]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<AccessoryIdentity>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AccessoryRegistry for JsonAccessoryCache {
    async fn register(&self, identity: &AccessoryIdentity) -> Result<(), BridgeError> {
        let snapshot = {
            let mut entries = self.lock_entries();
            match entries.iter_mut().find(|e| e.uuid == identity.uuid) {
                Some(existing) => *existing = identity.clone(),
                None => entries.push(identity.clone()),
            }
            entries.clone()
        };
        self.persist(&snapshot).map_err(BridgeError::from)?;
        tracing::debug!(address = %identity.address, "accessory identity persisted");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<AccessoryIdentity>, BridgeError> {
        Ok(self.lock_entries().clone())
    }
}
