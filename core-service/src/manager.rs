//! Driver registry and disk construction.

use crate::disk::Disk;
use crate::error::{CoreError, Result};
use bridge_traits::http::HttpClient;
use bridge_traits::storage::FilesystemAdapter;
use core_auth::{
    ClientCredentialsConfig, ClientCredentialsProvider, StaticTokenProvider, TokenCache,
    TokenProvider,
};
use core_runtime::config::{DiskConfig, FilesystemConfig, ONEDRIVE_DRIVER, SHAREPOINT_DRIVER};
use provider_sharepoint::{DriveScope, SharePointAdapter};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Shared services available to driver factories.
#[derive(Clone)]
pub struct DriverContext {
    pub http_client: Arc<dyn HttpClient>,
    pub token_cache: Arc<TokenCache>,
}

/// Builds an adapter for a disk configuration.
pub type DriverFactory =
    Arc<dyn Fn(&DiskConfig, &DriverContext) -> Result<Arc<dyn FilesystemAdapter>> + Send + Sync>;

/// Factory behind the `sharepoint` and `onedrive` drivers.
///
/// A configured `access_token` is used as-is; otherwise tokens come from the
/// client credentials flow through the shared token cache.
pub fn sharepoint_driver(
    config: &DiskConfig,
    context: &DriverContext,
) -> Result<Arc<dyn FilesystemAdapter>> {
    config.validate()?;

    let token_provider: Arc<dyn TokenProvider> = match config.access_token() {
        Some(token) => Arc::new(StaticTokenProvider::new(token)),
        None => Arc::new(ClientCredentialsProvider::new(
            ClientCredentialsConfig::from_disk_config(config)?,
            Arc::clone(&context.http_client),
            Arc::clone(&context.token_cache),
        )),
    };

    let adapter = SharePointAdapter::new(
        Arc::clone(&context.http_client),
        token_provider,
        DriveScope::from_drive_id(config.drive_id()),
        &config.prefix,
    )
    .with_base_url(config.graph_base_url.clone());

    Ok(Arc::new(adapter))
}

/// Resolves named disks from configuration.
///
/// # Example
///
/// ```ignore
/// use core_service::StorageManager;
///
/// let manager = StorageManager::from_env()?;
/// let disk = manager.disk("sharepoint")?;
/// disk.put("reports/q1.txt", "numbers").await?;
/// ```
pub struct StorageManager {
    config: FilesystemConfig,
    context: DriverContext,
    drivers: HashMap<String, DriverFactory>,
    disks: Mutex<HashMap<String, Disk>>,
}

impl StorageManager {
    /// Create a manager with the `sharepoint` and `onedrive` drivers registered.
    pub fn new(config: FilesystemConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let mut manager = Self {
            config,
            context: DriverContext {
                http_client,
                token_cache: Arc::new(TokenCache::default()),
            },
            drivers: HashMap::new(),
            disks: Mutex::new(HashMap::new()),
        };

        manager.extend(SHAREPOINT_DRIVER, sharepoint_driver);
        // Older configurations name the driver after OneDrive
        manager.extend(ONEDRIVE_DRIVER, sharepoint_driver);
        manager
    }

    /// Manager over `ReqwestHttpClient` configured from the environment.
    #[cfg(feature = "desktop-shims")]
    pub fn from_env() -> Result<Self> {
        let http_client = bridge_desktop::ReqwestHttpClient::new()
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
        Ok(Self::new(FilesystemConfig::from_env(), Arc::new(http_client)))
    }

    /// Share a token cache, e.g. between managers or with a test clock.
    pub fn with_token_cache(mut self, token_cache: Arc<TokenCache>) -> Self {
        self.context.token_cache = token_cache;
        self
    }

    /// Register (or replace) a driver.
    pub fn extend<F>(&mut self, driver: impl Into<String>, factory: F)
    where
        F: Fn(&DiskConfig, &DriverContext) -> Result<Arc<dyn FilesystemAdapter>>
            + Send
            + Sync
            + 'static,
    {
        let driver = driver.into();
        debug!(driver = %driver, "Registering filesystem driver");
        self.drivers.insert(driver, Arc::new(factory));
    }

    pub fn has_driver(&self, driver: &str) -> bool {
        self.drivers.contains_key(driver)
    }

    pub fn config(&self) -> &FilesystemConfig {
        &self.config
    }

    pub fn context(&self) -> &DriverContext {
        &self.context
    }

    /// Resolve a disk by name, building it on first use.
    pub fn disk(&self, name: &str) -> Result<Disk> {
        if let Some(disk) = self.lock_disks()?.get(name) {
            return Ok(disk.clone());
        }

        let disk_config = self.config.disk(name)?;
        let factory = self.drivers.get(&disk_config.driver).ok_or_else(|| {
            CoreError::UnsupportedDriver {
                driver: disk_config.driver.clone(),
                disk: name.to_string(),
            }
        })?;

        let adapter = factory(disk_config, &self.context)?;
        let disk = Disk::new(name, adapter, disk_config.throw);
        info!(disk = name, driver = %disk_config.driver, "Filesystem disk ready");

        Ok(self
            .lock_disks()?
            .entry(name.to_string())
            .or_insert(disk)
            .clone())
    }

    pub fn default_disk(&self) -> Result<Disk> {
        let name = self.config.default_disk_name().ok_or_else(|| {
            CoreError::InitializationFailed("No filesystem disks are configured.".to_string())
        })?;
        self.disk(name)
    }

    /// Drop a memoized disk so the next lookup rebuilds it.
    pub fn forget_disk(&self, name: &str) -> Result<()> {
        self.lock_disks()?.remove(name);
        Ok(())
    }

    fn lock_disks(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Disk>>> {
        self.disks
            .lock()
            .map_err(|_| CoreError::InitializationFailed("Disk registry lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse, HttpStreamResponse};
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn download_stream(&self, request: HttpRequest) -> BridgeResult<HttpStreamResponse>;
        }
    }

    fn config() -> FilesystemConfig {
        let mut config = FilesystemConfig::default();
        config.insert_disk(
            "sharepoint",
            DiskConfig::builder()
                .access_token("static")
                .drive_id("b!abc")
                .build()
                .unwrap(),
        );
        config.insert_disk(
            "legacy",
            DiskConfig::builder()
                .driver("onedrive")
                .client_id("id")
                .client_secret("secret")
                .throw(true)
                .build()
                .unwrap(),
        );
        config
    }

    fn manager(config: FilesystemConfig) -> StorageManager {
        StorageManager::new(config, Arc::new(MockHttpClient::new()))
    }

    #[test]
    fn test_default_drivers_registered() {
        let manager = manager(config());
        assert!(manager.has_driver("sharepoint"));
        assert!(manager.has_driver("onedrive"));
        assert!(!manager.has_driver("s3"));
    }

    #[test]
    fn test_disk_is_built_from_config() {
        let manager = manager(config());

        let disk = manager.disk("sharepoint").unwrap();
        assert_eq!(disk.name(), "sharepoint");
        assert!(!disk.throws());

        let legacy = manager.disk("legacy").unwrap();
        assert!(legacy.throws());
    }

    #[test]
    fn test_default_disk() {
        let manager = manager(config());
        assert_eq!(manager.default_disk().unwrap().name(), "sharepoint");

        let empty = self::manager(FilesystemConfig::default());
        assert!(matches!(
            empty.default_disk(),
            Err(CoreError::InitializationFailed(_))
        ));
    }

    #[test]
    fn test_unknown_disk() {
        let error = manager(config()).disk("archive").unwrap_err();
        assert!(matches!(error, CoreError::Config(_)));
        assert!(error
            .to_string()
            .contains("Disk [archive] does not have a configured driver."));
    }

    #[test]
    fn test_unsupported_driver() {
        let mut config = config();
        config.insert_disk(
            "blob",
            DiskConfig::builder().driver("azure").build().unwrap(),
        );

        let error = manager(config).disk("blob").unwrap_err();
        assert!(matches!(
            error,
            CoreError::UnsupportedDriver { ref driver, .. } if driver == "azure"
        ));
    }

    #[test]
    fn test_missing_credentials_fail_disk_construction() {
        let mut config = FilesystemConfig::default();
        config.disks.insert("sharepoint".to_string(), DiskConfig::default());

        assert!(manager(config).disk("sharepoint").is_err());
    }

    #[test]
    fn test_extend_registers_custom_driver() {
        let mut config = config();
        config.insert_disk(
            "custom",
            DiskConfig::builder().driver("memory").build().unwrap(),
        );

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut manager = manager(config);
        manager.extend("memory", move |disk_config, context| {
            counter.fetch_add(1, Ordering::SeqCst);
            assert_eq!(disk_config.driver, "memory");
            sharepoint_driver(
                &DiskConfig {
                    access_token: Some("t".to_string()),
                    ..disk_config.clone()
                },
                context,
            )
        });

        manager.disk("custom").unwrap();
        manager.disk("custom").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        manager.forget_disk("custom").unwrap();
        manager.disk("custom").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
