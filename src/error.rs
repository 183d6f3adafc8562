/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network or request execution error from `reqwest`, surfaced after the
    /// retry budget is exhausted.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Non-success HTTP status code with raw response body. Not produced for
    /// 429 (retried in place) or 401 (becomes [`ApiError::SessionExpired`]).
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    /// The backend answered 401; the persisted session has been cleared.
    #[error("session expired: authentication is required")]
    SessionExpired,
    /// Response body decoding error.
    #[error("decode error: {0}")]
    Decode(String),
    /// Request path or base URL could not be combined into a valid URL.
    #[error("invalid request url: {0}")]
    Url(String),
}
