use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    request::RetryContext, throttle::Throttle, ApiError, ApiRequest, ClientOptions, Result,
    Session, SessionStore,
};

/// Callback invoked when a 401 invalidates the session. The hosting
/// application decides what "go to login" means.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// HTTP client for the PickleCart storefront REST API.
///
/// Every call passes a shared throttle gate, carries the persisted bearer
/// token when one exists, backs off on 429, retries transport failures
/// against a bounded per-call budget, and invalidates the session on 401.
/// Clones share the throttle state and session storage.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
    throttle: Arc<Throttle>,
    options: ClientOptions,
    on_session_expired: Option<SessionExpiredHook>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("session", &self.session)
            .field("options", &self.options)
            .finish()
    }
}

impl ApiClient {
    /// Creates a client with in-memory session storage and default options.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_session(base_url, Session::in_memory())
    }

    /// Creates a client backed by an external session store, e.g. one
    /// persisted by the hosting application.
    pub fn with_session_store(
        base_url: impl Into<String>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self::with_session(base_url, Session::new(store))
    }

    fn with_session(base_url: impl Into<String>, session: Session) -> Self {
        let options = ClientOptions::default();
        let throttle = Arc::new(Throttle::new(Duration::from_millis(
            options.min_request_interval_ms,
        )));
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session,
            throttle,
            options,
            on_session_expired: None,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `PICKLECART_API_URL` — backend base URL
    /// - `PICKLECART_TOKEN` — optional bearer token seeding the session
    ///
    /// Returns an error if the URL variable is missing or empty.
    pub fn from_env() -> std::result::Result<Self, String> {
        let base_url = std::env::var("PICKLECART_API_URL")
            .map_err(|_| "missing PICKLECART_API_URL environment variable".to_owned())?;
        if base_url.trim().is_empty() {
            return Err("PICKLECART_API_URL is set but empty".to_owned());
        }
        let client = Self::new(base_url.trim());
        if let Ok(token) = std::env::var("PICKLECART_TOKEN") {
            if !token.trim().is_empty() {
                client.session.set_token(strip_bearer_prefix(&token));
            }
        }
        Ok(client)
    }

    /// Applies client options such as timeout, throttle spacing and retry
    /// behavior. Rebuilds the throttle gate, so apply options before sharing
    /// clones of the client.
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.throttle = Arc::new(Throttle::new(Duration::from_millis(
            options.min_request_interval_ms,
        )));
        self.options = options;
        self
    }

    /// Registers the hook fired when a 401 clears the session.
    pub fn on_session_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    /// Session storage handle shared with this client.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Sends a request and decodes the success body as JSON.
    pub async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let body = self.send(request).await?;
        serde_json::from_str(&body)
            .map_err(|err| ApiError::Decode(format!("invalid response JSON: {err}; body: {body}")))
    }

    /// Sends a request through the full resilience pipeline and returns the
    /// raw success body.
    ///
    /// Failure handling, in priority order: 429 backs off by the server's
    /// `retry-after` and resends; transport failures retry with linear
    /// backoff until the per-call budget is spent; 401 clears the session
    /// and returns [`ApiError::SessionExpired`]; anything else surfaces as
    /// [`ApiError::Http`] with the body intact.
    pub async fn send(&self, request: ApiRequest) -> Result<String> {
        let url = self.resolve_url(&request.path)?;
        let mut retry = RetryContext::new(
            self.options.max_retries,
            Duration::from_millis(self.options.retry_base_delay_ms),
        );

        loop {
            // Resends re-enter the gate and re-read the token, so a request
            // retried across a login/logout picks up the current session.
            self.throttle.acquire().await;

            let response = self.dispatch(&request, &url).await;

            match response {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let delay = self.retry_after(&response);
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            "rate limited on {}, retrying after {} s",
                            request.path,
                            delay.as_secs()
                        );
                        sleep(delay).await;
                        continue;
                    }

                    if status == StatusCode::UNAUTHORIZED {
                        self.invalidate_session();
                        return Err(ApiError::SessionExpired);
                    }

                    let body = response.text().await.map_err(ApiError::Transport)?;
                    if status.is_success() {
                        return Ok(body);
                    }
                    return Err(ApiError::Http {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(err) => {
                    if is_retryable_transport(&err) {
                        if let Some(delay) = retry.next_delay() {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(
                                "transport failure on {} ({err}), retry {}/{} after {} ms",
                                request.path,
                                retry.attempts(),
                                retry.max_retries(),
                                delay.as_millis()
                            );
                            sleep(delay).await;
                            continue;
                        }
                    }
                    return Err(ApiError::Transport(err));
                }
            }
        }
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        url: &str,
    ) -> std::result::Result<Response, reqwest::Error> {
        let timeout_ms = request.timeout_ms.unwrap_or(self.options.timeout_ms);
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(Duration::from_millis(timeout_ms));

        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await
    }

    fn resolve_url(&self, path: &str) -> Result<String> {
        if !path.starts_with('/') {
            return Err(ApiError::Url(format!(
                "path must start with '/': {path}"
            )));
        }
        Ok(format!("{}{path}", self.base_url.trim_end_matches('/')))
    }

    fn retry_after(&self, response: &Response) -> Duration {
        let fallback = self.options.rate_limit_fallback_secs;
        let secs = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(fallback);
        Duration::from_secs(secs)
    }

    pub(crate) fn invalidate_session(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("received 401, clearing session");
        self.session.clear();
        if let Some(hook) = &self.on_session_expired {
            hook();
        }
    }
}

fn is_retryable_transport(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

/// Accepts tokens pasted with a `Bearer ` prefix and stores the bare value;
/// the client adds the scheme itself on every request.
fn strip_bearer_prefix(token: &str) -> &str {
    let trimmed = token.trim();
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim_start(),
        _ => trimmed,
    }
}
