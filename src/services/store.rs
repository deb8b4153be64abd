use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// The single raster format datasets are stored in.
pub const IMAGE_EXTENSION: &str = "png";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid dataset path: {path}")]
    InvalidPath { path: String },

    #[error("Failed to list {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to delete {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What happened when a frame's backing file was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    AlreadyMissing,
}

/// Where frames live. Identifiers are file names relative to the store.
pub trait FrameStore: Send + Sync {
    fn location(&self) -> &Path;

    /// All image identifiers, sorted lexicographically.
    fn list(&self) -> Result<Vec<String>, StoreError>;

    fn path_of(&self, id: &str) -> PathBuf;

    fn read(&self, id: &str) -> io::Result<Vec<u8>>;

    /// Delete the backing file. A file that is already gone is not an error.
    fn remove(&self, id: &str) -> Result<Removal, StoreError>;
}

/// A flat directory of `.png` files.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FrameStore for DirectoryStore {
    fn location(&self) -> &Path {
        &self.root
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::InvalidPath {
                path: self.root.to_string_lossy().to_string(),
            });
        }

        let mut images = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| StoreError::List {
                path: self.root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                log::warn!("Skipping non UTF-8 file name: {}", entry.path().display());
                continue;
            };
            if name.ends_with(&format!(".{}", IMAGE_EXTENSION)) {
                images.push(name.to_string());
            }
        }

        images.sort();
        Ok(images)
    }

    fn path_of(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    fn read(&self, id: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_of(id))
    }

    fn remove(&self, id: &str) -> Result<Removal, StoreError> {
        let path = self.path_of(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(Removal::Deleted),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("{} was already gone", path.display());
                Ok(Removal::AlreadyMissing)
            }
            Err(source) => Err(StoreError::Remove { path, source }),
        }
    }
}
