//! Filesystem service façade.
//!
//! This crate wires configuration, the host HTTP bridge and the token cache
//! into named [`Disk`]s. Drivers are looked up by name in the
//! [`StorageManager`]; the `sharepoint` driver (also registered as
//! `onedrive`) is available out of the box and hosts may add their own with
//! [`StorageManager::extend`]. Desktop hosts typically enable the
//! `desktop-shims` feature, which provides [`StorageManager::from_env`] on top
//! of `bridge-desktop`.

pub mod disk;
pub mod error;
pub mod manager;
pub mod path;

pub use disk::Disk;
pub use error::{CoreError, Result};
pub use manager::{sharepoint_driver, DriverContext, DriverFactory, StorageManager};
pub use path::normalize_path;

pub use bridge_traits::storage::{
    FilesystemAdapter, FilesystemError, FilesystemResult, StorageAttributes,
};
pub use core_runtime::config::{DiskConfig, FilesystemConfig};
