//! Microsoft Graph drive connector
//!
//! Implements `FilesystemAdapter` on top of the Graph driveItem API for
//! SharePoint document libraries and OneDrive.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{
    FileAttributes, FilesystemAdapter, FilesystemError, FilesystemResult, MetadataKind,
    StorageAttributes, Visibility, WriteOptions,
};
use bytes::Bytes;
use core_auth::TokenProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, instrument, warn};

use crate::error::{ProviderError, Result};
use crate::listing::{parse_timestamp, to_storage_attributes};
use crate::paths::{DriveScope, GraphPaths};
use crate::prefixer::PathPrefixer;
use crate::types::{ChildrenPage, CopyParentReference, CopyRequest, CreateFolderRequest, DriveItem};

/// Microsoft Graph API base URL
pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Uploads may take much longer than metadata calls.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

const VISIBILITY_UNSUPPORTED: &str = "SharePoint/OneDrive does not support visibility settings.";

/// Graph drive connector
///
/// Every request resolves a fresh bearer token through the injected
/// [`TokenProvider`], so cached client credentials tokens are renewed
/// transparently.
///
/// # Example
///
/// ```ignore
/// use provider_sharepoint::{DriveScope, SharePointAdapter};
/// use bridge_traits::storage::FilesystemAdapter;
///
/// let adapter = SharePointAdapter::new(
///     http_client,
///     token_provider,
///     DriveScope::Drive("b!abc".into()),
///     "Shared/Uploads",
/// );
/// let report = adapter.read("2024/q1.pdf").await?;
/// ```
pub struct SharePointAdapter {
    http_client: Arc<dyn HttpClient>,
    token_provider: Arc<dyn TokenProvider>,
    paths: GraphPaths,
    base_url: String,
}

impl SharePointAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        token_provider: Arc<dyn TokenProvider>,
        scope: DriveScope,
        prefix: &str,
    ) -> Self {
        Self {
            http_client,
            token_provider,
            paths: GraphPaths::new(scope, PathPrefixer::new(prefix)),
            base_url: GRAPH_API_BASE.to_string(),
        }
    }

    /// Override the API base URL (national clouds, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn paths(&self) -> &GraphPaths {
        &self.paths
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Request for an absolute URL with the bearer token attached.
    async fn authorized(&self, method: HttpMethod, url: String) -> Result<HttpRequest> {
        let token = self.token_provider.access_token().await?;
        Ok(HttpRequest::new(method, url)
            .bearer_token(token)
            .header("Accept", "application/json"))
    }

    /// Execute and map non-2xx responses to [`ProviderError`].
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            debug!(status = response.status, "Graph request failed");
            return Err(ProviderError::from_response(&response));
        }
        Ok(response)
    }

    async fn get_item(&self, path: &str) -> Result<DriveItem> {
        let request = self
            .authorized(HttpMethod::Get, self.url(&self.paths.item_path(path)))
            .await?;
        let response = self.send(request).await?;
        response
            .json()
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }

    async fn delete_item(&self, path: &str) -> Result<()> {
        let request = self
            .authorized(HttpMethod::Delete, self.url(&self.paths.item_path(path)))
            .await?;
        self.send(request).await?;
        Ok(())
    }

    async fn upload(&self, path: &str, contents: Bytes) -> Result<()> {
        let request = self
            .authorized(HttpMethod::Put, self.url(&self.paths.content_path(path)))
            .await?
            .header("Content-Type", "application/octet-stream")
            .timeout(UPLOAD_TIMEOUT)
            .body(contents);
        self.send(request).await?;
        Ok(())
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        let (endpoint, name) = self.paths.folder_target(path);
        let request = self
            .authorized(HttpMethod::Post, self.url(&endpoint))
            .await?
            .json(&CreateFolderRequest::new(name))?;
        self.send(request).await?;
        Ok(())
    }

    async fn copy_item(&self, source: &str, destination: &str) -> Result<()> {
        let (parent_path, name) = self.paths.copy_target(destination);
        let body = CopyRequest {
            parent_reference: CopyParentReference { path: parent_path },
            name,
        };
        let request = self
            .authorized(HttpMethod::Post, self.url(&self.paths.copy_path(source)))
            .await?
            .json(&body)?;

        // 202 Accepted: the copy finishes in a background job
        self.send(request).await?;
        Ok(())
    }

    /// All children of `path`, following `@odata.nextLink` pages.
    async fn fetch_children(&self, path: &str) -> Result<Vec<DriveItem>> {
        let mut items = Vec::new();
        let mut next_url = Some(self.url(&self.paths.children_path(path)));

        while let Some(url) = next_url.take() {
            let request = self.authorized(HttpMethod::Get, url).await?;
            let response = self.send(request).await?;
            let page: ChildrenPage = response
                .json()
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;

            debug!(count = page.value.len(), "Fetched children page");
            items.extend(page.value);
            next_url = page.next_link;
        }

        Ok(items)
    }

    /// Listing in pre-order: each folder is yielded before its contents.
    async fn collect_listing(&self, path: &str, deep: bool) -> Result<Vec<StorageAttributes>> {
        let prefixer = self.paths.prefixer();
        let mut entries = Vec::new();
        let mut stack = vec![self.fetch_children(path).await?.into_iter()];

        loop {
            let next = match stack.last_mut() {
                Some(children) => children.next(),
                None => break,
            };
            let Some(item) = next else {
                stack.pop();
                continue;
            };

            let entry = to_storage_attributes(&item, prefixer);
            let descend = deep && entry.is_dir();
            let child_path = entry.path().to_string();
            entries.push(entry);

            if descend {
                stack.push(self.fetch_children(&child_path).await?.into_iter());
            }
        }

        Ok(entries)
    }

    async fn metadata(&self, path: &str, kind: MetadataKind) -> FilesystemResult<DriveItem> {
        self.get_item(path)
            .await
            .map_err(|e| FilesystemError::UnableToRetrieveMetadata {
                location: path.to_string(),
                kind,
                reason: e.to_string(),
            })
    }
}

fn missing_metadata(path: &str, kind: MetadataKind) -> FilesystemError {
    FilesystemError::UnableToRetrieveMetadata {
        location: path.to_string(),
        kind,
        reason: format!("Microsoft Graph did not report a {} for this item.", kind),
    }
}

#[async_trait]
impl FilesystemAdapter for SharePointAdapter {
    #[instrument(skip(self))]
    async fn file_exists(&self, path: &str) -> bool {
        match self.get_item(path).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Treating item as missing");
                false
            }
        }
    }

    #[instrument(skip(self))]
    async fn directory_exists(&self, path: &str) -> bool {
        match self.get_item(path).await {
            Ok(item) => item.is_folder(),
            Err(e) => {
                debug!(error = %e, "Treating directory as missing");
                false
            }
        }
    }

    #[instrument(skip(self, contents, _options), fields(size = contents.len()))]
    async fn write(
        &self,
        path: &str,
        contents: Bytes,
        _options: &WriteOptions,
    ) -> FilesystemResult<()> {
        self.upload(path, contents)
            .await
            .map_err(|e| FilesystemError::UnableToWriteFile {
                location: path.to_string(),
                reason: e.to_string(),
            })
    }

    #[instrument(skip(self, contents, options))]
    async fn write_stream(
        &self,
        path: &str,
        mut contents: Box<dyn AsyncRead + Send + Unpin>,
        options: &WriteOptions,
    ) -> FilesystemResult<()> {
        let mut buffer = Vec::new();
        contents
            .read_to_end(&mut buffer)
            .await
            .map_err(|e| FilesystemError::UnableToWriteFile {
                location: path.to_string(),
                reason: format!("Failed to read source stream: {}", e),
            })?;

        self.write(path, Bytes::from(buffer), options).await
    }

    #[instrument(skip(self))]
    async fn read(&self, path: &str) -> FilesystemResult<Bytes> {
        let result = async {
            let request = self
                .authorized(HttpMethod::Get, self.url(&self.paths.content_path(path)))
                .await?;
            let response = self.send(request).await?;
            Ok::<_, ProviderError>(response.body)
        }
        .await;

        result.map_err(|e| FilesystemError::UnableToReadFile {
            location: path.to_string(),
            reason: e.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn read_stream(&self, path: &str) -> FilesystemResult<Box<dyn AsyncRead + Send + Unpin>> {
        let result = async {
            let request = self
                .authorized(HttpMethod::Get, self.url(&self.paths.content_path(path)))
                .await?;
            let response = self.http_client.download_stream(request).await?;
            if !response.is_success() {
                let buffered = response.buffer().await?;
                return Err(ProviderError::from_response(&buffered));
            }
            Ok::<_, ProviderError>(response.body)
        }
        .await;

        result.map_err(|e| FilesystemError::UnableToReadFile {
            location: path.to_string(),
            reason: e.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> FilesystemResult<()> {
        self.delete_item(path)
            .await
            .map_err(|e| FilesystemError::UnableToDeleteFile {
                location: path.to_string(),
                reason: e.to_string(),
            })
    }

    #[instrument(skip(self))]
    async fn delete_directory(&self, path: &str) -> FilesystemResult<()> {
        self.delete_item(path)
            .await
            .map_err(|e| FilesystemError::UnableToDeleteDirectory {
                location: path.to_string(),
                reason: e.to_string(),
            })
    }

    #[instrument(skip(self, _options))]
    async fn create_directory(&self, path: &str, _options: &WriteOptions) -> FilesystemResult<()> {
        self.create_folder(path)
            .await
            .map_err(|e| FilesystemError::UnableToCreateDirectory {
                location: path.to_string(),
                reason: e.to_string(),
            })
    }

    async fn set_visibility(&self, path: &str, _visibility: Visibility) -> FilesystemResult<()> {
        Err(FilesystemError::UnableToSetVisibility {
            location: path.to_string(),
            reason: VISIBILITY_UNSUPPORTED.to_string(),
        })
    }

    async fn visibility(&self, path: &str) -> FilesystemResult<FileAttributes> {
        Err(FilesystemError::UnableToRetrieveMetadata {
            location: path.to_string(),
            kind: MetadataKind::Visibility,
            reason: VISIBILITY_UNSUPPORTED.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn mime_type(&self, path: &str) -> FilesystemResult<FileAttributes> {
        let item = self.metadata(path, MetadataKind::MimeType).await?;
        let mime_type = item
            .mime_type()
            .ok_or_else(|| missing_metadata(path, MetadataKind::MimeType))?
            .to_string();

        let mut attributes = FileAttributes::new(path);
        attributes.file_size = item.size;
        attributes.last_modified = parse_timestamp(item.last_modified_date_time.as_deref());
        attributes.mime_type = Some(mime_type);
        Ok(attributes)
    }

    #[instrument(skip(self))]
    async fn last_modified(&self, path: &str) -> FilesystemResult<FileAttributes> {
        let item = self.metadata(path, MetadataKind::LastModified).await?;
        let timestamp = parse_timestamp(item.last_modified_date_time.as_deref())
            .ok_or_else(|| missing_metadata(path, MetadataKind::LastModified))?;

        let mut attributes = FileAttributes::new(path);
        attributes.last_modified = Some(timestamp);
        Ok(attributes)
    }

    #[instrument(skip(self))]
    async fn file_size(&self, path: &str) -> FilesystemResult<FileAttributes> {
        let item = self.metadata(path, MetadataKind::FileSize).await?;
        let size = item
            .size
            .ok_or_else(|| missing_metadata(path, MetadataKind::FileSize))?;

        let mut attributes = FileAttributes::new(path);
        attributes.file_size = Some(size);
        Ok(attributes)
    }

    #[instrument(skip(self))]
    async fn list_contents(
        &self,
        path: &str,
        deep: bool,
    ) -> FilesystemResult<Vec<StorageAttributes>> {
        self.collect_listing(path, deep)
            .await
            .map_err(|e| FilesystemError::UnableToListContents {
                location: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Copy, confirm the destination exists, then delete the source.
    ///
    /// Graph runs copies as background jobs, so a `202 Accepted` does not
    /// mean the destination has been written. Deleting the source before the
    /// job has read it would lose the file; when the destination is not
    /// visible yet the source is kept and `UnableToMoveFile` is returned.
    #[instrument(skip(self, options))]
    async fn move_file(
        &self,
        source: &str,
        destination: &str,
        options: &WriteOptions,
    ) -> FilesystemResult<()> {
        self.copy(source, destination, options)
            .await
            .map_err(|e| FilesystemError::UnableToMoveFile {
                from: source.to_string(),
                to: destination.to_string(),
                reason: e.to_string(),
            })?;

        if let Err(e) = self.get_item(destination).await {
            warn!(
                error = %e,
                "Copy accepted but the destination is not available yet; keeping the source"
            );
            return Err(FilesystemError::UnableToMoveFile {
                from: source.to_string(),
                to: destination.to_string(),
                reason: format!(
                    "Copy was accepted but has not completed; the source was kept. {}",
                    e
                ),
            });
        }

        if let Err(e) = self.delete_item(source).await {
            warn!(
                error = %e,
                "Copied file but failed to delete the source; it now exists at both locations"
            );
            return Err(FilesystemError::MoveLeftDuplicate {
                from: source.to_string(),
                to: destination.to_string(),
                reason: e.to_string(),
            });
        }

        Ok(())
    }

    #[instrument(skip(self, _options))]
    async fn copy(
        &self,
        source: &str,
        destination: &str,
        _options: &WriteOptions,
    ) -> FilesystemResult<()> {
        self.copy_item(source, destination)
            .await
            .map_err(|e| FilesystemError::UnableToCopyFile {
                from: source.to_string(),
                to: destination.to_string(),
                reason: e.to_string(),
            })
    }
}
