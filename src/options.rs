/// Configures timeout, throttling and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of transport-failure retries after the initial attempt.
    pub max_retries: u32,
    /// Base retry backoff in milliseconds; attempt `k` waits `k × base`.
    pub retry_base_delay_ms: u64,
    /// Minimum spacing between outgoing requests, shared across all callers
    /// of one client.
    pub min_request_interval_ms: u64,
    /// Backoff applied to a 429 response that carries no `retry-after`
    /// header, in seconds.
    pub rate_limit_fallback_secs: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            max_retries: 3,
            retry_base_delay_ms: 1_000,
            min_request_interval_ms: 1_000,
            rate_limit_fallback_secs: 5,
        }
    }
}
