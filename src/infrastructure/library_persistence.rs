use crate::domain::errors::StrategyError;
use crate::domain::library::StrategyLibrary;
use crate::domain::ports::BlobStore;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Blob key under which the whole library lives.
pub const LIBRARY_KEY: &str = "strategies";

/// File-backed key-value store: one JSON file per key under a config
/// directory in the user's home.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new() -> Result<Self> {
        // Use ~/.stratforge, mirroring other local tooling config dirs
        let home = std::env::var("HOME").context("Could not find HOME directory")?;
        let dir = PathBuf::from(home).join(".stratforge");

        if !dir.exists() {
            fs::create_dir_all(&dir).context("Failed to create config directory")?;
        }

        Ok(Self { dir })
    }

    /// Store rooted at an explicit directory. Used by tests and by callers
    /// that keep their library somewhere other than the home directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StrategyError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) => Err(StrategyError::persistence(format!(
                "read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), StrategyError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .map_err(|e| StrategyError::persistence(format!("create store dir: {e}")))?;
        }

        // Atomic write: write to temp file then rename
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, blob)
            .map_err(|e| StrategyError::persistence(format!("write {}: {}", path.display(), e)))?;
        fs::rename(&temp_path, &path)
            .map_err(|e| StrategyError::persistence(format!("rename {}: {}", path.display(), e)))?;
        Ok(())
    }
}

/// Sole reader/writer of the durable library blob.
///
/// Every mutation of the collection goes through [`LibraryGateway::save`] as
/// a full-collection replace; there is no delta format. Loads fail soft: an
/// absent or malformed blob yields an empty library and a log line, never an
/// error to the caller, so a corrupt store cannot brick the session.
#[derive(Clone)]
pub struct LibraryGateway {
    store: Arc<dyn BlobStore>,
}

impl LibraryGateway {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> StrategyLibrary {
        match self.store.get(LIBRARY_KEY) {
            Ok(Some(blob)) => match serde_json::from_str::<StrategyLibrary>(&blob) {
                Ok(library) => {
                    info!("Loaded {} saved strategies", library.len());
                    library
                }
                Err(e) => {
                    warn!("Stored strategy library is malformed, starting empty: {}", e);
                    StrategyLibrary::new()
                }
            },
            Ok(None) => StrategyLibrary::new(),
            Err(e) => {
                warn!("Failed to read strategy library, starting empty: {}", e);
                StrategyLibrary::new()
            }
        }
    }

    pub fn save(&self, library: &StrategyLibrary) -> Result<(), StrategyError> {
        let blob = serde_json::to_string_pretty(library)
            .map_err(|e| StrategyError::persistence(format!("serialize library: {e}")))?;
        self.store.set(LIBRARY_KEY, &blob)?;
        info!("Persisted {} strategies", library.len());
        Ok(())
    }
}
