//! # Disk Configuration
//!
//! Configuration model for Graph-backed disks.
//!
//! ## Overview
//!
//! A [`FilesystemConfig`] holds any number of named disks. Each
//! [`DiskConfig`] selects a driver and carries the credentials, drive scope
//! and root prefix for one SharePoint document library or OneDrive.
//!
//! Configuration can be assembled three ways, and merged:
//!
//! - from JSON (`FilesystemConfig::from_json_str` / `from_json_file`)
//! - from the process environment (`FilesystemConfig::from_env`)
//! - programmatically with [`DiskConfig::builder`]
//!
//! ## Environment Variables
//!
//! | Variable | Used for | Default |
//! |----------|----------|---------|
//! | `GRAPH_CLIENT_ID` | app registration client id | none |
//! | `GRAPH_CLIENT_SECRET` | app registration secret | none |
//! | `GRAPH_TENANT_ID` | directory tenant | `common` |
//! | `SHAREPOINT_DRIVE_ID` | drive scope of both disks | personal drive |
//! | `SHAREPOINT_PREFIX` | root folder of the `sharepoint` disk | empty |
//! | `ONEDRIVE_PREFIX` | root folder of the `onedrive` disk | empty |
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{DiskConfig, FilesystemConfig};
//!
//! let mut config = FilesystemConfig::from_env();
//! config.insert_disk(
//!     "reports",
//!     DiskConfig::builder()
//!         .client_id("app-id")
//!         .client_secret("secret")
//!         .drive_id("b!abc")
//!         .prefix("Shared/Reports")
//!         .throw(true)
//!         .build()?,
//! );
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Microsoft Graph v1.0 endpoint
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Microsoft identity platform host
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Tenant used when none is configured
pub const DEFAULT_TENANT_ID: &str = "common";

/// Driver name of the Graph adapter
pub const SHAREPOINT_DRIVER: &str = "sharepoint";

/// Legacy driver name kept for existing configurations
pub const ONEDRIVE_DRIVER: &str = "onedrive";

/// Configuration of a single disk.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Registered driver used to build the disk
    pub driver: String,

    /// Azure AD application (client) id
    pub client_id: Option<String>,

    /// Azure AD application secret
    pub client_secret: Option<String>,

    /// Directory tenant id or domain
    pub tenant_id: String,

    /// Drive to address; `None` addresses the caller's personal drive
    pub drive_id: Option<String>,

    /// Folder inside the drive that acts as the disk root
    pub prefix: String,

    /// Return errors from the disk instead of swallowing them
    pub throw: bool,

    /// Graph endpoint (override for national clouds and tests)
    pub graph_base_url: String,

    /// Identity platform host (override for national clouds and tests)
    pub authority_host: String,

    /// Pre-issued bearer token; skips the client-credentials flow
    pub access_token: Option<String>,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            driver: SHAREPOINT_DRIVER.to_string(),
            client_id: None,
            client_secret: None,
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            drive_id: None,
            prefix: String::new(),
            throw: false,
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            access_token: None,
        }
    }
}

impl fmt::Debug for DiskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskConfig")
            .field("driver", &self.driver)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("tenant_id", &self.tenant_id)
            .field("drive_id", &self.drive_id)
            .field("prefix", &self.prefix)
            .field("throw", &self.throw)
            .field("graph_base_url", &self.graph_base_url)
            .field("authority_host", &self.authority_host)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DiskConfig {
    /// Creates a builder for constructing a [`DiskConfig`].
    pub fn builder() -> DiskConfigBuilder {
        DiskConfigBuilder::default()
    }

    /// Client id, treating blank values as absent.
    pub fn client_id(&self) -> Option<&str> {
        non_empty(&self.client_id)
    }

    /// Client secret, treating blank values as absent.
    pub fn client_secret(&self) -> Option<&str> {
        non_empty(&self.client_secret)
    }

    /// Drive id, treating blank values as absent.
    ///
    /// Environment-driven configs commonly set `SHAREPOINT_DRIVE_ID=` to mean
    /// "use the personal drive".
    pub fn drive_id(&self) -> Option<&str> {
        non_empty(&self.drive_id)
    }

    /// Pre-issued access token, treating blank values as absent.
    pub fn access_token(&self) -> Option<&str> {
        non_empty(&self.access_token)
    }

    /// Tenant id, falling back to `common` when blank.
    pub fn tenant_id(&self) -> &str {
        let tenant = self.tenant_id.trim();
        if tenant.is_empty() {
            DEFAULT_TENANT_ID
        } else {
            tenant
        }
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - A driver is named
    /// - Graph and authority URLs are HTTP(S) URLs
    /// - Graph drivers have either a static token or client credentials
    pub fn validate(&self) -> Result<()> {
        if self.driver.trim().is_empty() {
            return Err(Error::Config("Disk driver cannot be empty".to_string()));
        }

        for (name, url) in [
            ("graph_base_url", &self.graph_base_url),
            ("authority_host", &self.authority_host),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        let graph_driver = self.driver == SHAREPOINT_DRIVER || self.driver == ONEDRIVE_DRIVER;
        if graph_driver
            && self.access_token().is_none()
            && (self.client_id().is_none() || self.client_secret().is_none())
        {
            return Err(Error::Config(
                "SharePoint/OneDrive credentials not configured. \
                 Set GRAPH_CLIENT_ID and GRAPH_CLIENT_SECRET in your environment."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`DiskConfig`] instances.
#[derive(Default)]
pub struct DiskConfigBuilder {
    config: DiskConfig,
}

impl DiskConfigBuilder {
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.config.driver = driver.into();
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.config.client_secret = Some(client_secret.into());
        self
    }

    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.config.tenant_id = tenant_id.into();
        self
    }

    pub fn drive_id(mut self, drive_id: impl Into<String>) -> Self {
        self.config.drive_id = Some(drive_id.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    pub fn throw(mut self, throw: bool) -> Self {
        self.config.throw = throw;
        self
    }

    pub fn graph_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.graph_base_url = url.into();
        self
    }

    pub fn authority_host(mut self, url: impl Into<String>) -> Self {
        self.config.authority_host = url.into();
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = Some(token.into());
        self
    }

    /// Builds and validates the [`DiskConfig`].
    pub fn build(self) -> Result<DiskConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Named disks available to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemConfig {
    /// Disk returned by `StorageManager::default_disk`
    pub default_disk: Option<String>,

    /// Disk configurations keyed by disk name
    pub disks: BTreeMap<String, DiskConfig>,
}

impl FilesystemConfig {
    /// Parses configuration from a JSON document.
    ///
    /// ```
    /// use core_runtime::config::FilesystemConfig;
    ///
    /// let config = FilesystemConfig::from_json_str(r#"{
    ///     "disks": { "docs": { "access_token": "t", "prefix": "Shared" } }
    /// }"#).unwrap();
    /// assert_eq!(config.disk("docs").unwrap().prefix, "Shared");
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid filesystem configuration: {}", e)))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&contents)
    }

    /// Builds the default `sharepoint` and `onedrive` disks from the process
    /// environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the default disks from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = DiskConfig {
            driver: SHAREPOINT_DRIVER.to_string(),
            client_id: lookup("GRAPH_CLIENT_ID"),
            client_secret: lookup("GRAPH_CLIENT_SECRET"),
            tenant_id: lookup("GRAPH_TENANT_ID").unwrap_or_else(|| DEFAULT_TENANT_ID.to_string()),
            drive_id: lookup("SHAREPOINT_DRIVE_ID"),
            ..DiskConfig::default()
        };

        let mut disks = BTreeMap::new();
        disks.insert(
            SHAREPOINT_DRIVER.to_string(),
            DiskConfig {
                prefix: lookup("SHAREPOINT_PREFIX").unwrap_or_default(),
                ..base.clone()
            },
        );
        disks.insert(
            ONEDRIVE_DRIVER.to_string(),
            DiskConfig {
                prefix: lookup("ONEDRIVE_PREFIX").unwrap_or_default(),
                ..base
            },
        );

        Self {
            default_disk: Some(SHAREPOINT_DRIVER.to_string()),
            disks,
        }
    }

    /// Adds or replaces a disk.
    pub fn insert_disk(&mut self, name: impl Into<String>, disk: DiskConfig) {
        self.disks.insert(name.into(), disk);
    }

    /// Overlays `other` on top of `self`; disks with the same name are
    /// replaced wholesale.
    pub fn merge(mut self, other: FilesystemConfig) -> Self {
        if other.default_disk.is_some() {
            self.default_disk = other.default_disk;
        }
        self.disks.extend(other.disks);
        self
    }

    /// Looks up a disk by name.
    pub fn disk(&self, name: &str) -> Result<&DiskConfig> {
        self.disks.get(name).ok_or_else(|| {
            Error::Config(format!("Disk [{}] does not have a configured driver.", name))
        })
    }

    /// Name of the default disk: the configured one, else `sharepoint` when
    /// present, else the first disk by name.
    pub fn default_disk_name(&self) -> Option<&str> {
        self.default_disk
            .as_deref()
            .or_else(|| {
                self.disks
                    .contains_key(SHAREPOINT_DRIVER)
                    .then_some(SHAREPOINT_DRIVER)
            })
            .or_else(|| self.disks.keys().next().map(String::as_str))
    }
}
