//! Bearer token providers and the shared token cache.

use crate::error::Result;
use crate::oauth::{ClientCredentialsConfig, ClientCredentialsFlow};
use async_trait::async_trait;
use bridge_traits::http::HttpClient;
use bridge_traits::time::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Seconds a token is reused; shorter than the 3600 s lifetime Graph issues.
pub const TOKEN_CACHE_TTL_SECS: i64 = 3500;

const CACHE_KEY_PREFIX: &str = "sharepoint_access_token_";

/// Supplies the bearer token attached to every Graph request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Pre-issued token handed in by the host.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Cache key for a set of credentials.
///
/// `sharepoint_access_token_` followed by the hex SHA-256 of the JSON array
/// `[client_id, tenant_id, drive_id]`, with an absent drive id written as `""`.
pub fn cache_key(client_id: &str, tenant_id: &str, drive_id: Option<&str>) -> String {
    let material =
        serde_json::json!([client_id, tenant_id, drive_id.unwrap_or_default()]).to_string();
    let digest = Sha256::digest(material.as_bytes());
    format!("{}{:x}", CACHE_KEY_PREFIX, digest)
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Memoizes tokens per key for a fixed TTL.
///
/// The lock is held while a token is fetched, so concurrent callers wait for
/// the in-flight request instead of issuing their own.
pub struct TokenCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedToken>>,
}

impl TokenCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl: Duration::seconds(TOKEN_CACHE_TTL_SECS),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Return the cached token for `key`, or run `fetch` and remember its
    /// result. Failed fetches are not cached.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<String>> + Send,
    {
        let mut entries = self.entries.lock().await;
        let now = self.clock.now();

        if let Some(cached) = entries.get(key) {
            if now < cached.expires_at {
                return Ok(cached.token.clone());
            }
            debug!("Cached token expired");
        }

        let token = fetch().await?;
        entries.insert(
            key.to_string(),
            CachedToken {
                token: token.clone(),
                expires_at: now + self.ttl,
            },
        );

        Ok(token)
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

/// Client credentials flow backed by a [`TokenCache`].
pub struct ClientCredentialsProvider {
    flow: ClientCredentialsFlow,
    cache: Arc<TokenCache>,
    key: String,
}

impl ClientCredentialsProvider {
    pub fn new(
        config: ClientCredentialsConfig,
        http_client: Arc<dyn HttpClient>,
        cache: Arc<TokenCache>,
    ) -> Self {
        let key = cache_key(
            &config.client_id,
            &config.tenant_id,
            config.drive_id.as_deref(),
        );
        Self {
            flow: ClientCredentialsFlow::new(config, http_client),
            cache,
            key,
        }
    }

    pub fn cache_key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    #[instrument(skip(self), fields(client_id = %self.flow.config().client_id))]
    async fn access_token(&self) -> Result<String> {
        self.cache
            .get_or_fetch(&self.key, move || async move {
                let token = self.flow.request_token().await?;
                Ok(token.access_token)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse, HttpStreamResponse};
    use bytes::Bytes;
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
            async fn download_stream(&self, request: HttpRequest) -> BridgeResult<HttpStreamResponse>;
        }
    }

    struct ManualClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: StdMutex::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap()),
            }
        }

        fn advance(&self, seconds: i64) {
            let mut now = self.now.lock().unwrap();
            *now += Duration::seconds(seconds);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn token_response(token: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(format!(
                r#"{{"access_token":"{}","expires_in":3599}}"#,
                token
            )),
        }
    }

    #[test]
    fn test_cache_key_format() {
        let key = cache_key("id", "common", Some("b!drive"));
        assert!(key.starts_with("sharepoint_access_token_"));
        assert_eq!(key.len(), "sharepoint_access_token_".len() + 64);
        assert!(key["sharepoint_access_token_".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_cache_key_distinguishes_credentials() {
        let base = cache_key("id", "common", None);
        assert_eq!(base, cache_key("id", "common", None));
        assert_ne!(base, cache_key("id", "contoso", None));
        assert_ne!(base, cache_key("id", "common", Some("b!drive")));
        assert_ne!(base, cache_key("other", "common", None));
        assert_eq!(base, cache_key("id", "common", Some("")));
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticTokenProvider::new("pre-issued");
        assert_eq!(provider.access_token().await.unwrap(), "pre-issued");
        assert!(!format!("{:?}", provider).contains("pre-issued"));
    }

    #[tokio::test]
    async fn test_cache_reuses_token_until_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = TokenCache::new(clock.clone());
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let fetch = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("token-{}", n))
        };

        assert_eq!(cache.get_or_fetch("k", fetch).await.unwrap(), "token-0");

        clock.advance(TOKEN_CACHE_TTL_SECS - 1);
        assert_eq!(cache.get_or_fetch("k", fetch).await.unwrap(), "token-0");

        clock.advance(1);
        assert_eq!(cache.get_or_fetch("k", fetch).await.unwrap(), "token-1");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_does_not_store_failures() {
        let cache = TokenCache::default();

        let result = cache
            .get_or_fetch("k", || async { Err(AuthError::CredentialsNotConfigured) })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);

        let token = cache
            .get_or_fetch("k", || async { Ok("fresh".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "fresh");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_cache_invalidate() {
        let cache = TokenCache::default();
        cache
            .get_or_fetch("k", || async { Ok("first".to_string()) })
            .await
            .unwrap();

        cache.invalidate("k").await;

        let token = cache
            .get_or_fetch("k", || async { Ok("second".to_string()) })
            .await
            .unwrap();
        assert_eq!(token, "second");

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_provider_fetches_once_for_concurrent_callers() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(token_response("shared")));

        let cache = Arc::new(TokenCache::default());
        let provider = Arc::new(ClientCredentialsProvider::new(
            ClientCredentialsConfig::new("id", "secret"),
            Arc::new(mock_http),
            cache.clone(),
        ));

        let (a, b) = tokio::join!(provider.access_token(), provider.access_token());
        assert_eq!(a.unwrap(), "shared");
        assert_eq!(b.unwrap(), "shared");
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_providers_share_cache_by_key() {
        let mut mock_http = MockHttpClient::new();
        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(token_response("shared")));
        let http: Arc<dyn HttpClient> = Arc::new(mock_http);

        let cache = Arc::new(TokenCache::default());
        let config = ClientCredentialsConfig::new("id", "secret").with_drive_id("b!drive");
        let first = ClientCredentialsProvider::new(config.clone(), http.clone(), cache.clone());
        let second = ClientCredentialsProvider::new(config, http, cache);

        assert_eq!(first.cache_key(), second.cache_key());
        assert_eq!(first.access_token().await.unwrap(), "shared");
        assert_eq!(second.access_token().await.unwrap(), "shared");
    }

    #[tokio::test]
    async fn test_provider_propagates_token_errors() {
        let mut mock_http = MockHttpClient::new();
        mock_http.expect_execute().returning(|_| {
            Ok(HttpResponse {
                status: 400,
                headers: HashMap::new(),
                body: Bytes::from_static(b"AADSTS7000215"),
            })
        });

        let provider = ClientCredentialsProvider::new(
            ClientCredentialsConfig::new("id", "bad"),
            Arc::new(mock_http),
            Arc::new(TokenCache::default()),
        );

        let error = provider.access_token().await.unwrap_err();
        assert!(matches!(
            error,
            AuthError::TokenRequestFailed { status: 400, .. }
        ));
    }
}
