/// All errors a fetch or trigger call can surface.
///
/// The poll loop treats every variant as retryable (skip to the next
/// tick); a one-shot manual fetch treats them as terminal for that call.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// 429 from the upstream API.
    #[error("too many requests, please try again later")]
    RateLimited,

    /// 403 from the upstream API.
    #[error("access forbidden, check your permissions")]
    Forbidden,

    /// 5xx from the upstream API.
    #[error("server error (status {status}), please try again later")]
    Server { status: u16 },

    /// Connection-level failure (DNS, refused, reset, ...).
    #[error("request failed: {0}")]
    Network(String),

    /// The response body was not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The per-request timeout elapsed before a response arrived.
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}
