//! Whole-file JSON document store
//!
//! A ledger owns exactly one document on disk. Reads never fail from the
//! caller's point of view: a missing file is created from the default and an
//! unparsable one is moved aside before the default takes its place. Writes
//! go through a sibling temp file and a rename so readers never observe a
//! half-written document.
//!
//! There is no locking. Two processes writing the same document race and
//! the last writer wins.

use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::error::{CareerError, Result};

/// File metadata shown on admin dashboards
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentInfo {
    pub path: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
}

/// Typed JSON document stored at a fixed path
#[derive(Debug, Clone)]
pub struct DocumentStore<D> {
    path: PathBuf,
    _doc: PhantomData<fn() -> D>,
}

impl<D> DocumentStore<D>
where
    D: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create parent directories and write the default document if the file
    /// does not exist yet. An existing file is left untouched.
    pub fn ensure(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        debug!("Initializing document {}", self.path.display());
        self.save(&D::default())
    }

    /// Load the document, recovering from a missing or corrupt file.
    pub fn load(&self) -> D {
        match self.read() {
            Ok(doc) => return doc,
            Err(CareerError::Io(e)) if e.kind() == ErrorKind::NotFound => {}
            Err(CareerError::Io(e)) => {
                // Unreadable but possibly intact; do not overwrite it.
                error!("Failed to read {}: {}", self.path.display(), e);
                return D::default();
            }
            Err(e) => {
                warn!(
                    "Document {} is corrupt ({}), reinitializing",
                    self.path.display(),
                    e
                );
                self.quarantine();
            }
        }

        if let Err(e) = self.ensure() {
            error!("Failed to initialize {}: {}", self.path.display(), e);
            return D::default();
        }

        match self.read() {
            Ok(doc) => doc,
            Err(e) => {
                error!("Reload of {} failed: {}", self.path.display(), e);
                D::default()
            }
        }
    }

    /// Overwrite the document. Failures are logged and returned.
    pub fn save(&self, doc: &D) -> Result<()> {
        let result = self.write(doc);
        if let Err(e) = &result {
            error!("Failed to save {}: {}", self.path.display(), e);
        }
        result
    }

    /// Copy the current file to `<stem>_backup_<timestamp>.json`. A counter
    /// suffix keeps backups taken within the same second apart.
    pub fn backup(&self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let target = self.sibling("_backup_");
        fs::copy(&self.path, &target)?;
        Ok(Some(target))
    }

    /// Size and modification time of the file, if it exists
    pub fn info(&self) -> Option<DocumentInfo> {
        let meta = fs::metadata(&self.path).ok()?;
        Some(DocumentInfo {
            path: self.path.display().to_string(),
            size_bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Local>::from),
        })
    }

    fn read(&self) -> Result<D> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write(&self, doc: &D) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Move a corrupt file to `<stem>.corrupt-<timestamp>.json`.
    fn quarantine(&self) {
        let target = self.sibling(".corrupt-");
        match fs::rename(&self.path, &target) {
            Ok(()) => warn!("Moved corrupt document to {}", target.display()),
            Err(e) => {
                error!(
                    "Could not move corrupt document {} aside: {}",
                    self.path.display(),
                    e
                );
                let _ = self.save(&D::default());
            }
        }
    }

    fn sibling(&self, infix: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let first = self
            .path
            .with_file_name(format!("{}{}{}.json", stem, infix, stamp));
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| {
                self.path
                    .with_file_name(format!("{}{}{}-{}.json", stem, infix, stamp, n))
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }
}
