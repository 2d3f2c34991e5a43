//! Filesystem Abstraction
//!
//! Platform-agnostic contract for remote storage backends. A backend
//! translates these path-based operations into its own API; the host only
//! ever sees [`FilesystemAdapter`], the attribute types and
//! [`FilesystemError`].

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Visibility of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// Attributes of a file entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileAttributes {
    /// Path relative to the adapter root
    pub path: String,
    /// Size in bytes
    pub file_size: Option<u64>,
    pub visibility: Option<Visibility>,
    /// Unix timestamp in seconds
    pub last_modified: Option<i64>,
    pub mime_type: Option<String>,
    /// Backend-specific extras (ids, etags, urls)
    pub extra_metadata: HashMap<String, String>,
}

impl FileAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Attributes of a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryAttributes {
    pub path: String,
    pub visibility: Option<Visibility>,
    pub last_modified: Option<i64>,
}

impl DirectoryAttributes {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// A single entry produced by a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageAttributes {
    File(FileAttributes),
    Directory(DirectoryAttributes),
}

impl StorageAttributes {
    pub fn path(&self) -> &str {
        match self {
            StorageAttributes::File(file) => &file.path,
            StorageAttributes::Directory(dir) => &dir.path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, StorageAttributes::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, StorageAttributes::Directory(_))
    }

    pub fn last_modified(&self) -> Option<i64> {
        match self {
            StorageAttributes::File(file) => file.last_modified,
            StorageAttributes::Directory(dir) => dir.last_modified,
        }
    }
}

/// Per-call options for write operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub visibility: Option<Visibility>,
    pub mime_type: Option<String>,
}

/// Which piece of metadata could not be retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Metadata,
    Visibility,
    MimeType,
    LastModified,
    FileSize,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetadataKind::Metadata => "metadata",
            MetadataKind::Visibility => "visibility",
            MetadataKind::MimeType => "mime_type",
            MetadataKind::LastModified => "last_modified",
            MetadataKind::FileSize => "file_size",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by filesystem operations.
///
/// Each variant names the operation that failed and the location it was
/// attempted on; `reason` carries the backend's explanation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilesystemError {
    #[error("Unable to read file from location: {location}. {reason}")]
    UnableToReadFile { location: String, reason: String },

    #[error("Unable to write file at location: {location}. {reason}")]
    UnableToWriteFile { location: String, reason: String },

    #[error("Unable to delete file located at: {location}. {reason}")]
    UnableToDeleteFile { location: String, reason: String },

    #[error("Unable to delete directory located at: {location}. {reason}")]
    UnableToDeleteDirectory { location: String, reason: String },

    #[error("Unable to create a directory at {location}. {reason}")]
    UnableToCreateDirectory { location: String, reason: String },

    #[error("Unable to copy file from {from} to {to}. {reason}")]
    UnableToCopyFile {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Unable to move file from {from} to {to}. {reason}")]
    UnableToMoveFile {
        from: String,
        to: String,
        reason: String,
    },

    /// The copy half of a move succeeded but removing the source failed, so
    /// the file now exists at both locations.
    #[error("Moved file from {from} to {to} but could not remove the source; the file exists at both locations. {reason}")]
    MoveLeftDuplicate {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Unable to retrieve the {kind} for file at location: {location}. {reason}")]
    UnableToRetrieveMetadata {
        location: String,
        kind: MetadataKind,
        reason: String,
    },

    #[error("Unable to set visibility for file {location}. {reason}")]
    UnableToSetVisibility { location: String, reason: String },

    #[error("Unable to list contents for '{location}'. {reason}")]
    UnableToListContents { location: String, reason: String },

    #[error("Path traversal detected: {path}")]
    PathTraversalDetected { path: String },

    #[error("Corrupted path detected: {path}")]
    CorruptedPathDetected { path: String },
}

impl FilesystemError {
    /// Location the failed operation was attempted on.
    pub fn location(&self) -> &str {
        match self {
            FilesystemError::UnableToReadFile { location, .. }
            | FilesystemError::UnableToWriteFile { location, .. }
            | FilesystemError::UnableToDeleteFile { location, .. }
            | FilesystemError::UnableToDeleteDirectory { location, .. }
            | FilesystemError::UnableToCreateDirectory { location, .. }
            | FilesystemError::UnableToRetrieveMetadata { location, .. }
            | FilesystemError::UnableToSetVisibility { location, .. }
            | FilesystemError::UnableToListContents { location, .. } => location,
            FilesystemError::UnableToCopyFile { from, .. }
            | FilesystemError::UnableToMoveFile { from, .. }
            | FilesystemError::MoveLeftDuplicate { from, .. } => from,
            FilesystemError::PathTraversalDetected { path }
            | FilesystemError::CorruptedPathDetected { path } => path,
        }
    }
}

pub type FilesystemResult<T> = std::result::Result<T, FilesystemError>;

/// Remote filesystem backend.
///
/// Paths are relative to the adapter's configured root and use `/` as the
/// separator. Implementations must not panic on backend failures; every
/// failure is reported through [`FilesystemError`].
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::{FilesystemAdapter, WriteOptions};
///
/// async fn publish(fs: &dyn FilesystemAdapter, report: Bytes) -> FilesystemResult<()> {
///     fs.create_directory("reports/2024", &WriteOptions::default()).await?;
///     fs.write("reports/2024/q1.pdf", report, &WriteOptions::default()).await
/// }
/// ```
#[async_trait]
pub trait FilesystemAdapter: Send + Sync {
    /// Whether a file (or any item) exists at `path`.
    ///
    /// Never fails; any backend error is reported as `false`.
    async fn file_exists(&self, path: &str) -> bool;

    /// Whether a directory exists at `path`.
    async fn directory_exists(&self, path: &str) -> bool;

    async fn write(
        &self,
        path: &str,
        contents: Bytes,
        options: &WriteOptions,
    ) -> FilesystemResult<()>;

    async fn write_stream(
        &self,
        path: &str,
        contents: Box<dyn AsyncRead + Send + Unpin>,
        options: &WriteOptions,
    ) -> FilesystemResult<()>;

    async fn read(&self, path: &str) -> FilesystemResult<Bytes>;

    async fn read_stream(&self, path: &str) -> FilesystemResult<Box<dyn AsyncRead + Send + Unpin>>;

    async fn delete(&self, path: &str) -> FilesystemResult<()>;

    async fn delete_directory(&self, path: &str) -> FilesystemResult<()>;

    async fn create_directory(&self, path: &str, options: &WriteOptions) -> FilesystemResult<()>;

    async fn set_visibility(&self, path: &str, visibility: Visibility) -> FilesystemResult<()>;

    async fn visibility(&self, path: &str) -> FilesystemResult<FileAttributes>;

    async fn mime_type(&self, path: &str) -> FilesystemResult<FileAttributes>;

    async fn last_modified(&self, path: &str) -> FilesystemResult<FileAttributes>;

    async fn file_size(&self, path: &str) -> FilesystemResult<FileAttributes>;

    /// List the entries below `path`; with `deep` the listing recurses into
    /// every sub-directory, yielding each directory before its contents.
    async fn list_contents(&self, path: &str, deep: bool) -> FilesystemResult<Vec<StorageAttributes>>;

    async fn move_file(
        &self,
        source: &str,
        destination: &str,
        options: &WriteOptions,
    ) -> FilesystemResult<()>;

    async fn copy(
        &self,
        source: &str,
        destination: &str,
        options: &WriteOptions,
    ) -> FilesystemResult<()>;
}
