use thiserror::Error;

/// Failures surfaced by the catalog and favorites clients.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Non-2xx status other than 429. Never retried.
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    /// 429 responses outlasted the retry budget.
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Connection or body-read failure, surfaced once the retry budget is spent.
    #[error("request failed: {0}")]
    Transport(String),

    /// Body decoded but did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Backend answered but reported a failure.
    #[error("backend refused the request")]
    Rejected,
}
