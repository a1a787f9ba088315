//! Request Timeout Scaling
//!
//! Outbound calls must never block indefinitely, but a fixed deadline kills
//! legitimately long generations. The request timeout therefore scales with
//! the output-token budget, bounded by an absolute ceiling.

use std::future::Future;
use std::time::Duration;

use crate::constants::network;
use crate::types::{AutopressError, Result};

/// Timeout for a chat completion with the given output-token budget.
///
/// Base of 60 s plus 30 s per 1000 tokens, capped at 600 s.
pub fn request_timeout(max_tokens: u32) -> Duration {
    let scaled = network::BASE_TIMEOUT_SECS
        + (max_tokens as u64 / 1000) * network::TIMEOUT_SECS_PER_1K_TOKENS;
    Duration::from_secs(scaled.min(network::MAX_TIMEOUT_SECS))
}

/// Execute an async operation with a timeout.
///
/// Returns a timeout error if the operation doesn't complete within the
/// specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(AutopressError::timeout(operation_name, timeout)),
    }
}
