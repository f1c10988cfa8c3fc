/*
[INPUT]:  HTTP configuration (base URL, timeouts, refresh interval)
[OUTPUT]: Shared transport with token slot, refresher and event bus
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Url};

use crate::auth::{CookieRefresher, TokenRefresher};
use crate::events::EventBus;
use crate::http::{Result, TaskpadError};

/// Base URL used when neither the config nor the environment provides one
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
/// Environment variable consulted for the base URL
pub const API_URL_ENV: &str = "TASKPAD_API_URL";

const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Period of the session auto-refresh timer
    pub refresh_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            base_url,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        self.refresh_interval = refresh_interval;
        self
    }
}

/// Main HTTP client for the task API.
///
/// Cloning is cheap; every clone shares the same transport, token copy and
/// event bus.
#[derive(Clone)]
pub struct TaskpadClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: Client,
    base_url: Url,
    config: ClientConfig,
    token: RwLock<Option<String>>,
    refresher: Arc<dyn TokenRefresher>,
    events: EventBus,
}

impl TaskpadClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    ///
    /// The refresh transport shares the cookie jar so the refresh cookie set
    /// by login is sent on `/api/auth/refresh`.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let jar = Arc::new(Jar::default());
        let refresher = CookieRefresher::new(&config, &base_url, jar.clone())?;
        Self::build(config, base_url, jar, Arc::new(refresher))
    }

    /// Create a client with a custom refresh strategy
    pub fn with_refresher(
        config: ClientConfig,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        Self::build(config, base_url, Arc::new(Jar::default()), refresher)
    }

    fn build(
        config: ClientConfig,
        base_url: Url,
        jar: Arc<Jar>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .cookie_provider(jar)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                config,
                token: RwLock::new(None),
                refresher,
                events: EventBus::new(),
            }),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Bus carrying forced-logout signals, token rotations and notices
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Replace the token injected into outgoing requests.
    ///
    /// An empty string clears it.
    pub fn set_access_token(&self, token: Option<String>) {
        let token = token.filter(|value| !value.is_empty());
        let mut guard = self.inner.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = token;
    }

    /// Token currently injected into outgoing requests
    pub fn access_token(&self) -> Option<String> {
        let guard = self.inner.token.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    pub(crate) fn refresher(&self) -> Arc<dyn TokenRefresher> {
        self.inner.refresher.clone()
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.inner.http_client
    }

    /// Build full URL for an API endpoint
    fn url(&self, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
        self.inner.base_url.join(endpoint)
    }

    /// Build request builder for an API endpoint
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.inner.http_client.request(method, url))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TaskpadError::Config(format!(
            "base URL must use http or https, got {other}"
        ))),
    }
}

impl fmt::Debug for TaskpadClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskpadClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("has_token", &self.access_token().is_some())
            .finish()
    }
}
