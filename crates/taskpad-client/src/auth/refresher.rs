/*
[INPUT]:  Refresh cookie held in the shared cookie jar
[OUTPUT]: Freshly issued access token
[POS]:    Auth layer - refresh cycle over an interceptor-free transport
[UPDATE]: When the refresh endpoint or its credential changes
*/

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::http::{ClientConfig, Result, TaskpadError};
use crate::types::{ErrorBody, TokenResponse};

const REFRESH_ENDPOINT: &str = "/api/auth/refresh";

/// Exchanges the implicit session credential for a new access token.
///
/// Implementations must not route through the interceptor pipeline.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Result<String>;
}

/// Refresher backed by a bare transport sharing the main client's cookies
#[derive(Debug)]
pub struct CookieRefresher {
    http_client: Client,
    endpoint: Url,
}

impl CookieRefresher {
    pub fn new(config: &ClientConfig, base_url: &Url, jar: Arc<Jar>) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .cookie_provider(jar)
            .build()?;

        Ok(Self {
            http_client,
            endpoint: base_url.join(REFRESH_ENDPOINT)?,
        })
    }
}

#[async_trait]
impl TokenRefresher for CookieRefresher {
    async fn refresh(&self) -> Result<String> {
        debug!(endpoint = %self.endpoint, "requesting token refresh");
        let response = self.http_client.post(self.endpoint.clone()).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let server_message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message);
            if status == StatusCode::UNAUTHORIZED {
                return Err(TaskpadError::unauthorized(server_message));
            }
            let message = server_message
                .clone()
                .unwrap_or_else(|| format!("refresh rejected with status {}", status.as_u16()));
            return Err(TaskpadError::api_error(status, message).with_server_message(server_message));
        }

        let body: TokenResponse = serde_json::from_slice(&bytes)?;
        if body.access_token.is_empty() {
            return Err(TaskpadError::InvalidResponse(
                "refresh returned an empty access token".to_string(),
            ));
        }
        Ok(body.access_token)
    }
}
