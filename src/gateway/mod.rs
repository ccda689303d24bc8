//! Platform gateway: live token validation and rate-limit-aware delivery.
//!
//! The [`Gateway`] trait is the seam between the posting loops and the chat
//! platform. The real implementation is [`discord::DiscordGateway`]; tests
//! substitute a stub.

pub mod discord;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub use discord::DiscordGateway;

/// One posting destination contract.
///
/// `send_message` is best-effort: it validates the token, retries transient
/// failures with backoff, honors server rate limits, and reports the final
/// outcome as a plain bool. It never mutates persisted state.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Live token check against the platform's current-user endpoint.
    /// Any non-success response or network failure reads as invalid.
    async fn validate_token(&self, token: &str) -> bool;

    /// Deliver one message to one channel. Returns `true` on delivery.
    async fn send_message(&self, token: &str, channel_id: &str, content: &str) -> bool;
}

/// Classification of a single delivery attempt.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    /// 2xx, message accepted.
    Delivered,
    /// 401, token is bad. Not retried.
    Unauthorized,
    /// 429 with the server-requested wait.
    RateLimited(Duration),
    /// Timeout, connection error, or any other error status.
    Transient(String),
}

/// Run delivery attempts up to `max_attempts`.
///
/// Rate limits sleep for the server-requested duration and consume one
/// attempt from the same budget; transient failures back off `2^attempt`
/// seconds before the next try. Unauthorized short-circuits to failure.
pub(crate) async fn drive_send<F, Fut>(max_attempts: u32, mut attempt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AttemptOutcome>,
{
    for n in 0..max_attempts {
        match attempt().await {
            AttemptOutcome::Delivered => return true,
            AttemptOutcome::Unauthorized => {
                warn!(attempt = n + 1, "delivery rejected: unauthorized");
                return false;
            }
            AttemptOutcome::RateLimited(wait) => {
                warn!(
                    attempt = n + 1,
                    wait_secs = wait.as_secs_f64(),
                    "rate limited, honoring server wait"
                );
                tokio::time::sleep(wait).await;
            }
            AttemptOutcome::Transient(reason) => {
                warn!(
                    attempt = n + 1,
                    max_attempts,
                    error = %reason,
                    "transient delivery failure"
                );
                if n + 1 >= max_attempts {
                    return false;
                }
                tokio::time::sleep(Duration::from_secs(1 << n)).await;
            }
        }
    }
    false
}
