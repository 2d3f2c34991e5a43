//! Workspace facade crate.
//!
//! Host applications depend on `graph-filesystem-workspace` and get the
//! SharePoint/OneDrive disk API from `core-service` without wiring the
//! individual crates.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
