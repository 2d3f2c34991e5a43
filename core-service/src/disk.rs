//! Named disk handed to the host.

use crate::path::normalize_path;
use bridge_traits::storage::{
    FilesystemAdapter, FilesystemResult, StorageAttributes, WriteOptions,
};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::warn;

/// Facade over a [`FilesystemAdapter`].
///
/// Paths are normalised before reaching the adapter. When the disk is
/// configured with `throw = false`, a failing operation is logged and
/// reported as `false`, `None` or an empty listing; with `throw = true` the
/// adapter error is returned. Invalid paths are always returned as errors.
#[derive(Clone)]
pub struct Disk {
    name: String,
    adapter: Arc<dyn FilesystemAdapter>,
    throw: bool,
}

impl fmt::Debug for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disk")
            .field("name", &self.name)
            .field("throw", &self.throw)
            .finish_non_exhaustive()
    }
}

impl Disk {
    pub fn new(name: impl Into<String>, adapter: Arc<dyn FilesystemAdapter>, throw: bool) -> Self {
        Self {
            name: name.into(),
            adapter,
            throw,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn throws(&self) -> bool {
        self.throw
    }

    pub fn adapter(&self) -> Arc<dyn FilesystemAdapter> {
        Arc::clone(&self.adapter)
    }

    fn settle<T>(
        &self,
        operation: &str,
        result: FilesystemResult<T>,
        fallback: T,
    ) -> FilesystemResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(error) if self.throw => Err(error),
            Err(error) => {
                warn!(disk = %self.name, operation, error = %error, "Filesystem operation failed");
                Ok(fallback)
            }
        }
    }

    pub async fn exists(&self, path: &str) -> FilesystemResult<bool> {
        let path = normalize_path(path)?;
        Ok(self.adapter.file_exists(&path).await)
    }

    pub async fn missing(&self, path: &str) -> FilesystemResult<bool> {
        Ok(!self.exists(path).await?)
    }

    pub async fn directory_exists(&self, path: &str) -> FilesystemResult<bool> {
        let path = normalize_path(path)?;
        Ok(self.adapter.directory_exists(&path).await)
    }

    /// File contents, `None` when the read fails on a non-throwing disk.
    pub async fn get(&self, path: &str) -> FilesystemResult<Option<Bytes>> {
        let path = normalize_path(path)?;
        let result = self.adapter.read(&path).await.map(Some);
        self.settle("get", result, None)
    }

    pub async fn read_stream(
        &self,
        path: &str,
    ) -> FilesystemResult<Option<Box<dyn AsyncRead + Send + Unpin>>> {
        let path = normalize_path(path)?;
        let result = self.adapter.read_stream(&path).await.map(Some);
        self.settle("read_stream", result, None)
    }

    pub async fn put(&self, path: &str, contents: impl Into<Bytes>) -> FilesystemResult<bool> {
        self.put_with_options(path, contents, &WriteOptions::default())
            .await
    }

    pub async fn put_with_options(
        &self,
        path: &str,
        contents: impl Into<Bytes>,
        options: &WriteOptions,
    ) -> FilesystemResult<bool> {
        let path = normalize_path(path)?;
        let result = self
            .adapter
            .write(&path, contents.into(), options)
            .await
            .map(|_| true);
        self.settle("put", result, false)
    }

    pub async fn write_stream(
        &self,
        path: &str,
        contents: Box<dyn AsyncRead + Send + Unpin>,
    ) -> FilesystemResult<bool> {
        let path = normalize_path(path)?;
        let result = self
            .adapter
            .write_stream(&path, contents, &WriteOptions::default())
            .await
            .map(|_| true);
        self.settle("write_stream", result, false)
    }

    pub async fn delete(&self, path: &str) -> FilesystemResult<bool> {
        let path = normalize_path(path)?;
        let result = self.adapter.delete(&path).await.map(|_| true);
        self.settle("delete", result, false)
    }

    pub async fn delete_directory(&self, path: &str) -> FilesystemResult<bool> {
        let path = normalize_path(path)?;
        let result = self.adapter.delete_directory(&path).await.map(|_| true);
        self.settle("delete_directory", result, false)
    }

    pub async fn make_directory(&self, path: &str) -> FilesystemResult<bool> {
        let path = normalize_path(path)?;
        let result = self
            .adapter
            .create_directory(&path, &WriteOptions::default())
            .await
            .map(|_| true);
        self.settle("make_directory", result, false)
    }

    pub async fn copy(&self, from: &str, to: &str) -> FilesystemResult<bool> {
        let from = normalize_path(from)?;
        let to = normalize_path(to)?;
        let result = self
            .adapter
            .copy(&from, &to, &WriteOptions::default())
            .await
            .map(|_| true);
        self.settle("copy", result, false)
    }

    /// Copy then delete. The source is only deleted once the copied file is
    /// visible at `to`. On a non-throwing disk a move whose delete failed
    /// reports `false` even though the destination now exists.
    pub async fn move_to(&self, from: &str, to: &str) -> FilesystemResult<bool> {
        let from = normalize_path(from)?;
        let to = normalize_path(to)?;
        let result = self
            .adapter
            .move_file(&from, &to, &WriteOptions::default())
            .await
            .map(|_| true);
        self.settle("move", result, false)
    }

    pub async fn size(&self, path: &str) -> FilesystemResult<Option<u64>> {
        let path = normalize_path(path)?;
        let result = self
            .adapter
            .file_size(&path)
            .await
            .map(|attributes| attributes.file_size);
        self.settle("size", result, None)
    }

    pub async fn last_modified(&self, path: &str) -> FilesystemResult<Option<i64>> {
        let path = normalize_path(path)?;
        let result = self
            .adapter
            .last_modified(&path)
            .await
            .map(|attributes| attributes.last_modified);
        self.settle("last_modified", result, None)
    }

    pub async fn mime_type(&self, path: &str) -> FilesystemResult<Option<String>> {
        let path = normalize_path(path)?;
        let result = self
            .adapter
            .mime_type(&path)
            .await
            .map(|attributes| attributes.mime_type);
        self.settle("mime_type", result, None)
    }

    pub async fn list_contents(
        &self,
        directory: &str,
        deep: bool,
    ) -> FilesystemResult<Vec<StorageAttributes>> {
        let directory = normalize_path(directory)?;
        let result = self.adapter.list_contents(&directory, deep).await;
        self.settle("list_contents", result, Vec::new())
    }

    /// File paths below `directory`, sorted.
    pub async fn files(&self, directory: &str, recursive: bool) -> FilesystemResult<Vec<String>> {
        let entries = self.list_contents(directory, recursive).await?;
        Ok(sorted_paths(entries, StorageAttributes::is_file))
    }

    pub async fn all_files(&self, directory: &str) -> FilesystemResult<Vec<String>> {
        self.files(directory, true).await
    }

    /// Directory paths below `directory`, sorted.
    pub async fn directories(
        &self,
        directory: &str,
        recursive: bool,
    ) -> FilesystemResult<Vec<String>> {
        let entries = self.list_contents(directory, recursive).await?;
        Ok(sorted_paths(entries, StorageAttributes::is_dir))
    }

    pub async fn all_directories(&self, directory: &str) -> FilesystemResult<Vec<String>> {
        self.directories(directory, true).await
    }
}

fn sorted_paths(
    entries: Vec<StorageAttributes>,
    keep: fn(&StorageAttributes) -> bool,
) -> Vec<String> {
    let mut paths: Vec<String> = entries
        .into_iter()
        .filter(|entry| keep(entry))
        .map(|entry| entry.path().to_string())
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::storage::{
        DirectoryAttributes, FileAttributes, FilesystemError, MetadataKind, Visibility,
    };
    use mockall::mock;
    use mockall::predicate::eq;

    mock! {
        Adapter {}

        #[async_trait]
        impl FilesystemAdapter for Adapter {
            async fn file_exists(&self, path: &str) -> bool;
            async fn directory_exists(&self, path: &str) -> bool;
            async fn write(&self, path: &str, contents: Bytes, options: &WriteOptions) -> FilesystemResult<()>;
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
            async fn list_contents(&self, path: &str, deep: bool) -> FilesystemResult<Vec<StorageAttributes>>;
            async fn move_file(&self, source: &str, destination: &str, options: &WriteOptions) -> FilesystemResult<()>;
            async fn copy(&self, source: &str, destination: &str, options: &WriteOptions) -> FilesystemResult<()>;
        }
    }

    fn disk(adapter: MockAdapter, throw: bool) -> Disk {
        Disk::new("sharepoint", Arc::new(adapter), throw)
    }

    fn read_error(path: &str) -> FilesystemError {
        FilesystemError::UnableToReadFile {
            location: path.to_string(),
            reason: "Item not found".to_string(),
        }
    }

    #[tokio::test]
    async fn test_paths_are_normalised() {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_file_exists()
            .with(eq("reports/q1.pdf"))
            .times(1)
            .returning(|_| true);

        let disk = disk(adapter, false);
        assert!(disk.exists("/reports\\./q1.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_traversal_is_always_an_error() {
        let adapter = MockAdapter::new();
        let disk = disk(adapter, false);

        let error = disk.get("../outside.txt").await.unwrap_err();
        assert!(matches!(error, FilesystemError::PathTraversalDetected { .. }));
    }

    #[tokio::test]
    async fn test_missing() {
        let mut adapter = MockAdapter::new();
        adapter.expect_file_exists().returning(|_| false);

        assert!(disk(adapter, false).missing("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_swallows_errors_when_not_throwing() {
        let mut adapter = MockAdapter::new();
        adapter.expect_read().returning(|path| Err(read_error(path)));

        assert_eq!(disk(adapter, false).get("a.txt").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_returns_errors_when_throwing() {
        let mut adapter = MockAdapter::new();
        adapter.expect_read().returning(|path| Err(read_error(path)));

        let error = disk(adapter, true).get("a.txt").await.unwrap_err();
        assert_eq!(error, read_error("a.txt"));
    }

    #[tokio::test]
    async fn test_get_returns_contents() {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_read()
            .returning(|_| Ok(Bytes::from_static(b"hello")));

        let contents = disk(adapter, true).get("a.txt").await.unwrap();
        assert_eq!(contents, Some(Bytes::from_static(b"hello")));
    }

    #[tokio::test]
    async fn test_put_reports_success_as_bool() {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_write()
            .withf(|path, contents, _| path == "a.txt" && contents.as_ref() == b"data")
            .times(1)
            .returning(|_, _, _| Ok(()));
        adapter
            .expect_write()
            .withf(|path, _, _| path == "b.txt")
            .returning(|path, _, _| {
                Err(FilesystemError::UnableToWriteFile {
                    location: path.to_string(),
                    reason: "Locked".to_string(),
                })
            });

        let disk = disk(adapter, false);
        assert!(disk.put("a.txt", "data").await.unwrap());
        assert!(!disk.put("b.txt", "data").await.unwrap());
    }

    #[tokio::test]
    async fn test_move_left_duplicate_surfaces_when_throwing() {
        let mut adapter = MockAdapter::new();
        adapter.expect_move_file().returning(|from, to, _| {
            Err(FilesystemError::MoveLeftDuplicate {
                from: from.to_string(),
                to: to.to_string(),
                reason: "Locked".to_string(),
            })
        });

        let error = disk(adapter, true).move_to("a.txt", "b.txt").await.unwrap_err();
        assert!(matches!(error, FilesystemError::MoveLeftDuplicate { .. }));
    }

    #[tokio::test]
    async fn test_metadata_helpers() {
        let mut adapter = MockAdapter::new();
        adapter.expect_file_size().returning(|path| {
            let mut attributes = FileAttributes::new(path);
            attributes.file_size = Some(42);
            Ok(attributes)
        });
        adapter.expect_last_modified().returning(|path| {
            Err(FilesystemError::UnableToRetrieveMetadata {
                location: path.to_string(),
                kind: MetadataKind::LastModified,
                reason: "missing".to_string(),
            })
        });
        adapter.expect_mime_type().returning(|path| {
            let mut attributes = FileAttributes::new(path);
            attributes.mime_type = Some("text/plain".to_string());
            Ok(attributes)
        });

        let disk = disk(adapter, false);
        assert_eq!(disk.size("a.txt").await.unwrap(), Some(42));
        assert_eq!(disk.last_modified("a.txt").await.unwrap(), None);
        assert_eq!(
            disk.mime_type("a.txt").await.unwrap().as_deref(),
            Some("text/plain")
        );
    }

    fn listing() -> Vec<StorageAttributes> {
        vec![
            StorageAttributes::Directory(DirectoryAttributes::new("b")),
            StorageAttributes::File(FileAttributes::new("b/z.txt")),
            StorageAttributes::Directory(DirectoryAttributes::new("a")),
            StorageAttributes::File(FileAttributes::new("m.txt")),
        ]
    }

    #[tokio::test]
    async fn test_files_and_directories_are_sorted() {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_list_contents()
            .with(eq("docs"), eq(true))
            .returning(|_, _| Ok(listing()));

        let disk = disk(adapter, true);
        assert_eq!(disk.all_files("/docs/").await.unwrap(), vec!["b/z.txt", "m.txt"]);
        assert_eq!(disk.all_directories("docs").await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_listing_failure_is_empty_when_not_throwing() {
        let mut adapter = MockAdapter::new();
        adapter.expect_list_contents().returning(|path, _| {
            Err(FilesystemError::UnableToListContents {
                location: path.to_string(),
                reason: "Item not found".to_string(),
            })
        });

        let disk = disk(adapter, false);
        assert!(disk.files("missing", false).await.unwrap().is_empty());
        assert!(disk.list_contents("missing", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_directory_operations() {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_create_directory()
            .with(eq("reports/2024"), mockall::predicate::always())
            .returning(|_, _| Ok(()));
        adapter
            .expect_delete_directory()
            .with(eq("reports"))
            .returning(|_| Ok(()));
        adapter.expect_directory_exists().returning(|_| true);

        let disk = disk(adapter, true);
        assert!(disk.make_directory("reports/2024/").await.unwrap());
        assert!(disk.directory_exists("reports").await.unwrap());
        assert!(disk.delete_directory("reports").await.unwrap());
    }
}
