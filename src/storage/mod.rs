//! Flat file storage for uploaded videos.
//!
//! Every stored object is a direct child of a single root directory and is
//! addressed by its bare file name.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Subdirectory of the root that holds uploads still being received.
const STAGING_DIR: &str = ".incoming";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("File {0} already exists")]
    AlreadyExists(String),

    #[error("I/O error on {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            name: name.into(),
            source,
        }
    }
}

/// Contents of an upload, either held in memory or spooled to disk.
#[derive(Debug)]
pub enum UploadBody {
    Memory(Bytes),
    Staged(StagedFile),
}

impl UploadBody {
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Memory(data) => data.len() as u64,
            Self::Staged(staged) => staged.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Bytes> for UploadBody {
    fn from(data: Bytes) -> Self {
        Self::Memory(data)
    }
}

/// An upload being written chunk by chunk into the staging directory.
///
/// Dropping it before it is saved removes the partial file.
#[derive(Debug)]
pub struct StagedFile {
    path: Option<PathBuf>,
    file: fs::File,
    len: u64,
}

impl StagedFile {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| StorageError::io(self.display_name(), e))?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn display_name(&self) -> String {
        self.path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    /// Flushes the data to disk and hands over the staged path.
    async fn finish(mut self) -> Result<PathBuf, StorageError> {
        let name = self.display_name();
        self.file
            .flush()
            .await
            .map_err(|e| StorageError::io(name.clone(), e))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| StorageError::io(name.clone(), e))?;
        self.path
            .take()
            .ok_or_else(|| StorageError::InvalidName(name))
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// One entry directly under the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub name: String,
    pub is_dir: bool,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write `body` under `name`.
    ///
    /// Never replaces an existing file: a taken name is
    /// [`StorageError::AlreadyExists`] and leaves the existing file untouched.
    async fn save(&self, name: &str, body: UploadBody) -> Result<(), StorageError>;

    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Remove `name`. A file that is already gone is not an error.
    async fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Direct children of the root, not recursive.
    async fn list_dir(&self) -> Result<Vec<StoredEntry>, StorageError>;

    /// Absolute location of `name`, used to hand the file to the HTTP layer.
    fn path_of(&self, name: &str) -> Result<PathBuf, StorageError>;
}

/// Local file system store rooted at the upload directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_exists(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::io(self.root.display().to_string(), e))
    }

    /// Opens a new staging file for an upload that is about to be received.
    ///
    /// Staged files live in a subdirectory, so orphan reconciliation never
    /// sees an upload in flight.
    pub async fn stage(&self) -> Result<StagedFile, StorageError> {
        let dir = self.root.join(STAGING_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(STAGING_DIR, e))?;

        let path = dir.join(format!("{}.part", uuid::Uuid::new_v4()));
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::io(path.display().to_string(), e))?;

        Ok(StagedFile {
            path: Some(path),
            file,
            len: 0,
        })
    }

    async fn write_new(full_path: &Path, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(full_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(name.to_string()));
            }
            Err(e) => return Err(StorageError::io(name, e)),
        };

        let write = async {
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await
        };

        if let Err(e) = write.await {
            // The file was created above, so it is ours to remove
            let _ = fs::remove_file(full_path).await;
            return Err(StorageError::io(name, e));
        }
        Ok(())
    }

    async fn persist_staged(
        full_path: &Path,
        name: &str,
        staged: StagedFile,
    ) -> Result<(), StorageError> {
        let staged_path = staged.finish().await?;

        // hard_link refuses an existing target, unlike rename
        let linked = fs::hard_link(&staged_path, full_path).await;
        let _ = fs::remove_file(&staged_path).await;

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists(name.to_string()))
            }
            Err(e) => Err(StorageError::io(name, e)),
        }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

/// Only bare file names are accepted; anything that could climb out of the root is rejected.
fn validate_name(name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');

    if invalid {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, name: &str, body: UploadBody) -> Result<(), StorageError> {
        let full_path = self.resolve(name)?;
        self.ensure_exists().await?;

        let size = body.len();
        match body {
            UploadBody::Memory(data) => Self::write_new(&full_path, name, &data).await?,
            UploadBody::Staged(staged) => Self::persist_staged(&full_path, name, staged).await?,
        }

        tracing::debug!("Saved {} bytes to {:?}", size, full_path);
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let full_path = self.resolve(name)?;
        match fs::metadata(&full_path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(name, e)),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let full_path = self.resolve(name)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                tracing::debug!("Deleted file {:?}", full_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(name, e)),
        }
    }

    async fn list_dir(&self) -> Result<Vec<StoredEntry>, StorageError> {
        let root_name = self.root.display().to_string();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(root_name, e)),
        };

        let mut listed = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(root_name.clone(), e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!("Skipping non UTF-8 entry in {}", root_name);
                continue;
            };
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .map_err(|e| StorageError::io(name.clone(), e))?;
            listed.push(StoredEntry { name, is_dir });
        }

        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    fn path_of(&self, name: &str) -> Result<PathBuf, StorageError> {
        self.resolve(name)
    }
}
