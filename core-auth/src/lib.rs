//! # Authentication Module
//!
//! Bearer tokens for Microsoft Graph.
//!
//! ## Overview
//!
//! Graph requests are authorised with an application token obtained through
//! the OAuth 2.0 client credentials grant. Tokens are memoized in a
//! [`TokenCache`] shared by every disk, keyed by the credentials they were
//! issued for, and reused for a fixed TTL slightly shorter than their real
//! lifetime.
//!
//! ## Features
//!
//! - Client credentials flow against the Microsoft identity platform
//! - TTL cache with single-flight fetches and an injectable clock
//! - Static tokens for hosts that acquire tokens themselves

pub mod error;
pub mod oauth;
pub mod token;

pub use error::{AuthError, Result};
pub use oauth::{AccessToken, ClientCredentialsConfig, ClientCredentialsFlow, GRAPH_DEFAULT_SCOPE};
pub use token::{
    cache_key, ClientCredentialsProvider, StaticTokenProvider, TokenCache, TokenProvider,
    TOKEN_CACHE_TTL_SECS,
};
