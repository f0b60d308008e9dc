//! Persistent JSON documents with open/mutate/flush semantics.
//!
//! A [`ConfigDocument`] is read in full when opened, mutated in memory through
//! `DerefMut`, and written back in full by [`ConfigDocument::commit`]. Writes
//! go to a sibling temp file which is then renamed over the target, so readers
//! never observe a half-written document. A modified document that is dropped
//! without being committed or discarded is flushed on scope exit.
//!
//! There is no cross-process locking: two invocations racing on the same
//! document may lose each other's updates.

use std::fs;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised while reading or writing a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document does not exist and the caller required it to.
    #[error("{} does not exist", path.display())]
    Missing {
        /// Path of the missing document.
        path: PathBuf,
    },

    /// The document could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path of the document.
        path: PathBuf,
        /// Underlying IO failure.
        source: io::Error,
    },

    /// The document exists but is not valid JSON for its schema.
    #[error("{} is not a valid document: {source}", path.display())]
    Parse {
        /// Path of the document.
        path: PathBuf,
        /// Underlying parse failure.
        source: serde_json::Error,
    },

    /// The in-memory value could not be serialised.
    #[error("failed to serialise {}: {source}", path.display())]
    Serialize {
        /// Path of the document.
        path: PathBuf,
        /// Underlying serialisation failure.
        source: serde_json::Error,
    },
}

impl DocumentError {
    /// Path of the document the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Missing { path }
            | Self::Io { path, .. }
            | Self::Parse { path, .. }
            | Self::Serialize { path, .. } => path,
        }
    }
}

/// A JSON document loaded from disk, flushed back when modified.
#[derive(Debug)]
pub struct ConfigDocument<T: Serialize> {
    path: PathBuf,
    data: T,
    dirty: bool,
}

impl<T> ConfigDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Open an existing document.
    ///
    /// An empty (or whitespace-only) file is treated as the default value.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        if !path.is_file() {
            return Err(DocumentError::Missing { path });
        }
        let data = read_value(&path)?;
        Ok(Self {
            path,
            data,
            dirty: false,
        })
    }

    /// Open a document, starting from the default value if it does not exist
    /// yet. Nothing is written unless the document is modified.
    pub fn open_or_default(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        let data = if path.is_file() {
            read_value(&path)?
        } else {
            T::default()
        };
        Ok(Self {
            path,
            data,
            dirty: false,
        })
    }

    /// Read a document's value without keeping a guard around.
    pub fn read(path: &Path) -> Result<T, DocumentError> {
        Ok(Self::open(path)?.into_inner())
    }

    /// Read a document's value, or the default if it does not exist.
    pub fn read_or_default(path: &Path) -> Result<T, DocumentError> {
        Ok(Self::open_or_default(path)?.into_inner())
    }

    /// Consume the guard without writing, returning the in-memory value.
    pub fn into_inner(mut self) -> T {
        self.dirty = false;
        std::mem::take(&mut self.data)
    }
}

impl<T: Serialize> ConfigDocument<T> {
    /// Create a guard for a brand-new document holding `data`. The document
    /// is considered modified and will be written on commit.
    pub fn create(path: impl Into<PathBuf>, data: T) -> Self {
        Self {
            path: path.into(),
            data,
            dirty: true,
        }
    }

    /// Location of the document on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the document now if it was modified, keeping the guard open.
    pub fn save(&mut self) -> Result<(), DocumentError> {
        if self.dirty {
            write_value(&self.path, &self.data)?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Write the document if it was modified and close the guard.
    pub fn commit(mut self) -> Result<(), DocumentError> {
        self.save()
    }

    /// Close the guard, dropping any in-memory modifications.
    pub fn discard(mut self) {
        self.dirty = false;
    }
}

impl<T: Serialize> Deref for ConfigDocument<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T: Serialize> DerefMut for ConfigDocument<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.dirty = true;
        &mut self.data
    }
}

impl<T: Serialize> Drop for ConfigDocument<T> {
    fn drop(&mut self) {
        if !self.dirty || std::thread::panicking() {
            return;
        }
        if let Err(e) = write_value(&self.path, &self.data) {
            tracing::warn!("Failed to flush {}: {e}", self.path.display());
        }
    }
}

fn read_value<T>(path: &Path) -> Result<T, DocumentError>
where
    T: DeserializeOwned + Default,
{
    let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&content).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_value<T: Serialize>(path: &Path, value: &T) -> Result<(), DocumentError> {
    let io_err = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut content =
        serde_json::to_string_pretty(value).map_err(|source| DocumentError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    content.push('\n');

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    // Atomic write: write to temp file, then rename
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(io_err)?;
    fs::rename(&temp_path, path).map_err(io_err)?;

    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RootDocument;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_fails() {
        let dir = TempDir::new().unwrap();
        let result = ConfigDocument::<RootDocument>::open(dir.path().join("config.json"));
        assert!(matches!(result, Err(DocumentError::Missing { .. })));
    }

    #[test]
    fn test_open_or_default_does_not_create() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        {
            let doc = ConfigDocument::<RootDocument>::open_or_default(&path).unwrap();
            assert!(doc.packs.is_empty());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_commit_writes_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut doc = ConfigDocument::<RootDocument>::open_or_default(&path).unwrap();
        doc.tone = Some("done.wav".to_string());
        doc.commit().unwrap();

        let back = ConfigDocument::<RootDocument>::read(&path).unwrap();
        assert_eq!(back.tone.as_deref(), Some("done.wav"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_drop_flushes_modified_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        {
            let mut doc = ConfigDocument::<RootDocument>::open_or_default(&path).unwrap();
            doc.remember
                .insert("ping".to_string(), vec!["localhost".to_string()]);
        }
        let back = ConfigDocument::<RootDocument>::read(&path).unwrap();
        assert_eq!(back.remember["ping"], vec!["localhost".to_string()]);
    }

    #[test]
    fn test_discard_skips_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut doc = ConfigDocument::<RootDocument>::open_or_default(&path).unwrap();
        doc.tone = Some("beep.wav".to_string());
        doc.discard();

        assert!(!path.exists());
    }

    #[test]
    fn test_empty_file_reads_as_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "  \n").unwrap();

        let doc = ConfigDocument::<RootDocument>::read(&path).unwrap();
        assert_eq!(doc, RootDocument::default());
    }

    #[test]
    fn test_corrupt_document_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ConfigDocument::<RootDocument>::read(&path).unwrap_err();
        assert!(matches!(err, DocumentError::Parse { .. }));
        assert_eq!(err.path(), path.as_path());
    }
}
