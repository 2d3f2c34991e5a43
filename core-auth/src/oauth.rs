//! OAuth 2.0 Client Credentials Flow
//!
//! Acquires application tokens for Microsoft Graph from the Microsoft
//! identity platform (RFC 6749 section 4.4).
//!
//! # Security
//!
//! - The client secret is only ever sent in the form body of the token request
//! - Tokens and secrets are skipped by every `#[instrument]` span
//! - `Debug` output of the configuration redacts the secret
//!
//! # Example
//!
//! ```no_run
//! use core_auth::oauth::{ClientCredentialsConfig, ClientCredentialsFlow};
//! use std::sync::Arc;
//!
//! # async fn example() -> core_auth::Result<()> {
//! # use bridge_traits::http::HttpClient;
//! # let http_client: Arc<dyn HttpClient> = todo!();
//! let config = ClientCredentialsConfig::new("app-id", "app-secret")
//!     .with_tenant_id("contoso.onmicrosoft.com");
//!
//! let flow = ClientCredentialsFlow::new(config, http_client);
//! let token = flow.request_token().await?;
//! println!("token valid for {}s", token.expires_in);
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use core_runtime::config::{DiskConfig, DEFAULT_AUTHORITY_HOST, DEFAULT_TENANT_ID};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Scope requesting every application permission granted to the app.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Client credentials for an Azure AD application.
#[derive(Clone)]
pub struct ClientCredentialsConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Directory (tenant) id or domain; `common` when not set
    pub tenant_id: String,
    /// Drive the credentials are used against; part of the token cache key
    pub drive_id: Option<String>,
    pub scope: String,
    /// Identity platform host, e.g. `https://login.microsoftonline.com`
    pub authority_host: String,
}

impl ClientCredentialsConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            drive_id: None,
            scope: GRAPH_DEFAULT_SCOPE.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
        }
    }

    /// Build the credentials for a configured disk.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialsNotConfigured`] when the client id or
    /// secret is missing.
    pub fn from_disk_config(disk: &DiskConfig) -> Result<Self> {
        let (Some(client_id), Some(client_secret)) = (disk.client_id(), disk.client_secret())
        else {
            return Err(AuthError::CredentialsNotConfigured);
        };

        let mut config = Self::new(client_id, client_secret)
            .with_tenant_id(disk.tenant_id())
            .with_authority_host(disk.authority_host.clone());
        config.drive_id = disk.drive_id().map(str::to_string);
        Ok(config)
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    pub fn with_drive_id(mut self, drive_id: impl Into<String>) -> Self {
        self.drive_id = Some(drive_id.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into();
        self
    }

    /// Token endpoint: `{authority}/{tenant}/oauth2/v2.0/token`
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(AuthError::CredentialsNotConfigured);
        }
        Ok(())
    }
}

impl fmt::Debug for ClientCredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("tenant_id", &self.tenant_id)
            .field("drive_id", &self.drive_id)
            .field("scope", &self.scope)
            .field("authority_host", &self.authority_host)
            .finish()
    }
}

/// Token issued by the identity platform.
#[derive(Clone)]
pub struct AccessToken {
    pub access_token: String,
    /// Lifetime reported by the token endpoint, in seconds
    pub expires_in: i64,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Client credentials grant against the Microsoft identity platform.
pub struct ClientCredentialsFlow {
    config: ClientCredentialsConfig,
    http_client: Arc<dyn HttpClient>,
}

impl ClientCredentialsFlow {
    pub fn new(config: ClientCredentialsConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &ClientCredentialsConfig {
        &self.config
    }

    /// Request a new application token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::CredentialsNotConfigured`] when id or secret is blank
    /// - [`AuthError::TokenRequestFailed`] when the endpoint answers non-2xx
    /// - [`AuthError::NetworkError`] when the request cannot be sent
    #[instrument(skip(self), fields(client_id = %self.config.client_id, tenant_id = %self.config.tenant_id))]
    pub async fn request_token(&self) -> Result<AccessToken> {
        self.config.ensure_configured()?;

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", self.config.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let request = HttpRequest::new(HttpMethod::Post, self.config.token_url())
            .form(&params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        tracing::debug!("Requesting client credentials token");

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            let status = response.status;
            let body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(status, "Token request rejected by identity platform");

            return Err(AuthError::TokenRequestFailed { status, body });
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::InvalidTokenResponse(e.to_string()))?;

        tracing::info!(
            "Obtained client credentials token (expires in {}s)",
            token_response.expires_in
        );

        Ok(AccessToken {
            access_token: token_response.access_token,
            expires_in: token_response.expires_in,
        })
    }
}

/// Token response from the identity platform.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600 // Default to 1 hour if not specified
}
