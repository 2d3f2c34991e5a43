//! # SharePoint Provider
//!
//! Implements `FilesystemAdapter` for Microsoft Graph drives (SharePoint
//! document libraries and OneDrive).
//!
//! ## Overview
//!
//! This module provides:
//! - Virtual path to Graph endpoint resolution below a configurable root prefix
//! - File reads, streamed downloads and uploads
//! - Folder creation, copy and copy-then-delete moves
//! - Paginated, optionally recursive listings with path reconstruction
//! - Graph error mapping (authentication, not found, throttling)

pub mod connector;
pub mod error;
pub mod listing;
pub mod paths;
pub mod prefixer;
pub mod types;

pub use connector::{SharePointAdapter, GRAPH_API_BASE};
pub use error::{ProviderError, Result};
pub use paths::{DriveScope, GraphPaths};
pub use prefixer::PathPrefixer;
