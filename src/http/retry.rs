//! Retry policy for artifact downloads with error classification.

use reqwest::StatusCode;
use thiserror::Error;

/// Maximum number of attempts for a download.
pub const MAX_RETRIES: usize = 3;

/// Delay between retry attempts in milliseconds.
pub const RETRY_DELAY_MS: u64 = 1000;

/// HTTP failures that will not succeed on another attempt.
#[derive(Debug, Error)]
pub enum NonRetryableError {
    #[error("rate limited by the release server (HTTP {0}); try again later")]
    RateLimited(u16),
    #[error("release asset not found (HTTP 404); this version may not be published for your platform")]
    NotFound,
    #[error("access denied by the release server (HTTP {0})")]
    Forbidden(u16),
    #[error("request rejected (HTTP {0})")]
    ClientError(u16),
}

/// Classifies an error as retryable or non-retryable.
/// Returns Ok(()) if the error is retryable.
pub fn classify_error(error: &reqwest::Error) -> Result<(), NonRetryableError> {
    let Some(status) = error.status() else {
        // Connection errors, timeouts, etc. are retryable
        return Ok(());
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(NonRetryableError::RateLimited(status.as_u16())),
        StatusCode::FORBIDDEN if error.to_string().contains("rate limit") => {
            Err(NonRetryableError::RateLimited(status.as_u16()))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(NonRetryableError::Forbidden(status.as_u16()))
        }
        StatusCode::NOT_FOUND => Err(NonRetryableError::NotFound),
        s if s.is_client_error() => Err(NonRetryableError::ClientError(s.as_u16())),
        // 5xx server errors are retryable
        _ => Ok(()),
    }
}

/// Converts an error from `error_for_status()` into an `anyhow::Error`,
/// replacing it with a `NonRetryableError` when another attempt is pointless.
pub fn check_retryable(error: reqwest::Error) -> anyhow::Error {
    match classify_error(&error) {
        Ok(()) => anyhow::Error::from(error),
        Err(non_retryable) => anyhow::Error::from(non_retryable),
    }
}
