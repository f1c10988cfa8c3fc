/*
[INPUT]:  Request builders, per-call RequestContext, current access token
[OUTPUT]: Responses after bearer injection and one-shot refresh-and-retry
[POS]:    HTTP layer - request/response interceptor stages
[UPDATE]: When changing retry policy, notice wording, or header injection
*/

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::events::ClientEvent;
use crate::http::error::user_message;
use crate::http::{Result, TaskpadClient, TaskpadError};
use crate::types::ErrorBody;

/// Notice published when the refresh cycle fails
pub const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please login again.";

/// Per-call state threaded through the interceptor stages.
///
/// Each outgoing call owns its own context, so concurrent requests have
/// independent single-retry budgets.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    retried: bool,
    allow_refresh: bool,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            retried: false,
            allow_refresh: true,
        }
    }

    /// Context for auth endpoints: a 401 is a plain failure there.
    pub fn without_refresh() -> Self {
        Self {
            allow_refresh: false,
            ..Self::new()
        }
    }

    pub fn retried(&self) -> bool {
        self.retried
    }

    fn can_refresh(&self) -> bool {
        self.allow_refresh && !self.retried
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskpadClient {
    /// Run a request through both interceptor stages.
    pub(crate) async fn execute(
        &self,
        builder: RequestBuilder,
        mut ctx: RequestContext,
    ) -> Result<Response> {
        let mut request = builder.build()?;

        loop {
            // Only keep a copy while a retry is still possible.
            let retry_copy = if ctx.can_refresh() {
                request.try_clone()
            } else {
                None
            };

            self.authorize(&mut request)?;
            debug!(
                request_id = %ctx.request_id,
                method = %request.method(),
                path = request.url().path(),
                retried = ctx.retried,
                "sending request"
            );

            let response = match self.http_client().execute(request).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(request_id = %ctx.request_id, error = %err, "transport failure");
                    self.events()
                        .error_notice(user_message(None, Some(&err.to_string())));
                    return Err(TaskpadError::Http(err));
                }
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let server_message = read_error_message(response).await;

            if status == StatusCode::UNAUTHORIZED {
                let Some(next) = retry_copy else {
                    debug!(request_id = %ctx.request_id, "401 without remaining retry budget");
                    return Err(TaskpadError::unauthorized(server_message));
                };

                ctx.retried = true;
                match self.refresh_for_retry(&ctx).await {
                    Ok(()) => {
                        request = next;
                        continue;
                    }
                    Err(refresh_err) => {
                        self.expire_session(&ctx, &refresh_err);
                        return Err(TaskpadError::unauthorized(server_message));
                    }
                }
            }

            let transport_message = format!("Request failed with status code {}", status.as_u16());
            let message = user_message(server_message.as_deref(), Some(&transport_message));
            debug!(
                request_id = %ctx.request_id,
                status = status.as_u16(),
                message = %message,
                "request rejected"
            );
            self.events().error_notice(message.clone());
            return Err(TaskpadError::api_error(status, message).with_server_message(server_message));
        }
    }

    /// Execute and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        ctx: RequestContext,
    ) -> Result<T> {
        let response = self.execute(builder, ctx).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Execute and discard the body
    pub(crate) async fn send_empty(&self, builder: RequestBuilder, ctx: RequestContext) -> Result<()> {
        self.execute(builder, ctx).await?;
        Ok(())
    }

    /// Request stage: attach the bearer credential when a token exists.
    fn authorize(&self, request: &mut Request) -> Result<()> {
        let headers = request.headers_mut();
        headers.remove(AUTHORIZATION);
        if let Some(token) = self.access_token() {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                TaskpadError::InvalidResponse("access token is not a valid header value".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(())
    }

    async fn refresh_for_retry(&self, ctx: &RequestContext) -> Result<()> {
        let token = self.refresher().refresh().await?;
        self.set_access_token(Some(token.clone()));
        self.events()
            .publish(ClientEvent::TokenRotated { access_token: token });
        info!(request_id = %ctx.request_id, "access token refreshed after 401, retrying");
        Ok(())
    }

    fn expire_session(&self, ctx: &RequestContext, refresh_err: &TaskpadError) {
        warn!(request_id = %ctx.request_id, error = %refresh_err, "token refresh failed; ending session");
        self.set_access_token(None);
        self.events().forced_logout();
        self.events().error_notice(SESSION_EXPIRED_NOTICE);
    }
}

async fn read_error_message(response: Response) -> Option<String> {
    let text = response.text().await.ok()?;
    serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_have_independent_budgets() {
        let mut first = RequestContext::new();
        let second = RequestContext::new();
        first.retried = true;

        assert!(!first.can_refresh());
        assert!(second.can_refresh());
        assert_ne!(first.request_id, second.request_id);
    }

    #[test]
    fn test_auth_context_never_refreshes() {
        let ctx = RequestContext::without_refresh();
        assert!(!ctx.retried());
        assert!(!ctx.can_refresh());
    }
}
