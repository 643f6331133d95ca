use thiserror::Error;

/// Crate-spanning error kinds, one variant per failure class in the error
/// handling design. Transient/retryable kinds carry enough detail for the
/// caller to decide whether to retry; fatal kinds are meant to abort a cycle.
#[derive(Debug, Error)]
pub enum Error {
    #[error("transient network failure: {0}")]
    Transient(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("could not parse LLM output: {0}")]
    Schema(String),

    #[error("policy violation: {0}")]
    Policy(String),

    #[error("persistence conflict: {0}")]
    Conflict(String),

    #[error("lock contention: another cycle is running")]
    LockContention,

    #[error("fatal configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Whether retrying the operation that produced this error is worthwhile.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_) | Error::RateLimited(_))
    }

    /// Whether this error should abort the whole cycle rather than just
    /// dropping the affected unit of work.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
