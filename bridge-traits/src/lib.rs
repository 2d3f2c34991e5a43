//! # Host Bridge Traits
//!
//! Contracts between the Graph filesystem core and the host application.
//!
//! ## Overview
//!
//! This crate defines the capabilities the core needs but does not own:
//! HTTP transport, a time source and a log sink. It also defines the
//! filesystem abstraction that the core exposes back to the host, so that
//! hosts depend on a single, backend-agnostic contract.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with opt-in retry and streaming bodies
//!
//! ### Storage
//! - [`FilesystemAdapter`](storage::FilesystemAdapter) - Path-based file operations implemented by storage backends
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! Transport-level bridges report [`BridgeError`](error::BridgeError).
//! Filesystem operations report [`FilesystemError`](storage::FilesystemError),
//! whose variants name the operation and location that failed.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single adapter can be shared
//! across async tasks.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, HttpStreamResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         todo!()
//!     }
//!
//!     async fn download_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, HttpStreamResponse, RetryPolicy};
pub use storage::{
    DirectoryAttributes, FileAttributes, FilesystemAdapter, FilesystemError, FilesystemResult,
    MetadataKind, StorageAttributes, Visibility, WriteOptions,
};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, SystemClock};
