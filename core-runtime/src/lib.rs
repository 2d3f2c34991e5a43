//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Graph filesystem core:
//! - Disk configuration (JSON files, environment variables, builders)
//! - Logging and tracing infrastructure
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the auth, provider and
//! service crates depend on. It establishes the configuration model and the
//! logging conventions used throughout the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{DiskConfig, DiskConfigBuilder, FilesystemConfig};
pub use error::{Error, Result};
