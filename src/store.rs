//! Persistence of the state document and the preferences
//!
//! Loading never fails from the caller's point of view: a missing, unreadable
//! or corrupt document degrades to an empty one. Saving is best-effort, the
//! in-memory state stays authoritative.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::codec::{self, DecodeLimits, PersistentDocument};
use crate::config::{PREFERENCES_FILE, STATE_FILE};
use crate::error::PersistenceError;
use crate::state::Preferences;

/// Named byte blobs on non-volatile storage
pub trait Storage {
    /// Read a whole file, `None` when it does not exist
    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Replace a whole file
    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError>;
}

impl<T: Storage + ?Sized> Storage for &mut T {
    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        (**self).read(name)
    }

    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        (**self).write(name, bytes)
    }
}

/// Volatile storage, for hosts without flash and for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), bytes.into());
    }
}

impl Storage for MemoryStorage {
    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.files.get(name).cloned())
    }

    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.files.insert(name.into(), bytes.to_vec());
        Ok(())
    }
}

/// Files in one directory
///
/// Writes go to a temporary sibling which is synced and renamed over the
/// target, so a reader never sees a partial document.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Storage for FileStorage {
    fn read(&mut self, name: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let path = self.path(name);
        if path.is_dir() {
            return Ok(None);
        }
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(PersistenceError::Unreadable(format!(
                "{}: {err}",
                path.display()
            ))),
        }
    }

    fn write(&mut self, name: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        let path = self.path(name);
        let tmp = self.path(&format!("{name}.tmp"));
        replace_file(&self.root, &tmp, &path, bytes)
            .map_err(|err| PersistenceError::WriteFailed(format!("{}: {err}", path.display())))
    }
}

fn replace_file(root: &Path, tmp: &Path, path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::create_dir_all(root)?;
    let mut file = fs::File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(tmp, path)
}

/// State and preferences documents on top of a [`Storage`]
#[derive(Debug)]
pub struct PersistenceStore<S> {
    storage: S,
    limits: DecodeLimits,
}

impl<S: Storage> PersistenceStore<S> {
    pub fn new(storage: S, limits: DecodeLimits) -> Self {
        Self { storage, limits }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Load the state document; empty when missing or unusable
    pub fn load_state(&mut self) -> PersistentDocument {
        match self.try_load_state() {
            Ok(document) => document,
            Err(err) => {
                warn!("discarding stored effect state: {err}");
                PersistentDocument::new()
            }
        }
    }

    /// Load the state document, reporting why it is unusable
    ///
    /// A missing document is not an error.
    pub fn try_load_state(&mut self) -> Result<PersistentDocument, PersistenceError> {
        let Some(bytes) = self.storage.read(STATE_FILE)? else {
            info!("no stored effect state");
            return Ok(PersistentDocument::new());
        };
        let document = codec::decode(&bytes, self.limits)?;
        debug!("loaded effect state for {} strips", document.len());
        Ok(document)
    }

    /// Write an encoded state document
    pub fn save_state(&mut self, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.storage.write(STATE_FILE, bytes).inspect_err(|err| {
            warn!("failed to save effect state: {err}");
        })
    }

    /// Load the preferences, `fallback` when missing or unusable
    pub fn load_preferences(&mut self, fallback: Preferences) -> Preferences {
        let bytes = match self.storage.read(PREFERENCES_FILE) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return fallback,
            Err(err) => {
                warn!("discarding stored preferences: {err}");
                return fallback;
            }
        };
        rmp_serde::from_slice(&bytes).unwrap_or_else(|err| {
            warn!("discarding stored preferences: {err}");
            fallback
        })
    }

    pub fn save_preferences(&mut self, preferences: Preferences) -> Result<(), PersistenceError> {
        let bytes = rmp_serde::to_vec_named(&preferences)
            .map_err(|err| PersistenceError::WriteFailed(err.to_string()))?;
        self.storage
            .write(PREFERENCES_FILE, &bytes)
            .inspect_err(|err| warn!("failed to save preferences: {err}"))
    }
}
