use thiserror::Error;

use stridebook_daybook::DedupKey;

/// One failed collaborator call. On the read path these are folded into
/// `SourceFailure`s; only the write path returns them to callers.
#[derive(Debug, Error)]
pub enum FetchError {
    /// 401/403. Never retried.
    #[error("{endpoint} auth failed ({status}): {message}")]
    Auth {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 400 and other non-retryable 4xx.
    #[error("{endpoint} request rejected ({status}): {message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 404 on a lookup that may legitimately have no answer.
    #[error("{endpoint} not found")]
    NotFound { endpoint: String },
    /// 429 after the last retry.
    #[error("{endpoint} rate limited after {attempts} attempts")]
    RateLimited { endpoint: String, attempts: u32 },
    /// 5xx after the last retry.
    #[error("{endpoint} upstream error after {attempts} attempts ({status})")]
    Upstream {
        endpoint: String,
        status: u16,
        attempts: u32,
    },
    /// Connect failure or timeout after the last retry.
    #[error("{endpoint} unreachable after {attempts} attempts: {message}")]
    Transport {
        endpoint: String,
        attempts: u32,
        message: String,
    },
    /// Body was not the expected JSON shape.
    #[error("{endpoint} returned an unreadable body: {message}")]
    Decode { endpoint: String, message: String },
    #[error("cannot build HTTP client: {0}")]
    ClientBuild(String),
}

/// Failure of a user-initiated edit. In-memory state is untouched when
/// one of these is returned.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("no transaction {0} in the current day book")]
    NotFound(DedupKey),
    #[error("ledger create failed: {0}")]
    Materialize(#[source] FetchError),
    #[error("ledger update failed: {0}")]
    Update(#[source] FetchError),
    #[error("ledger create for {0} returned no id")]
    MissingId(DedupKey),
}
