//! Discord REST gateway.
//!
//! Talks to the Discord v9 HTTP API directly via reqwest (no heavy SDK
//! dependency). Tokens are user tokens passed in the `Authorization` header;
//! message creation is a POST to `/channels/{id}/messages`.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{error, info};

use crate::config::SenderConfig;
use crate::gateway::{drive_send, AttemptOutcome, Gateway};

pub struct DiscordGateway {
    client: reqwest::Client,
    api_base: String,
    max_retries: u32,
    rate_limit_fallback: Duration,
}

impl DiscordGateway {
    pub fn new(cfg: &SenderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            max_retries: cfg.max_retries,
            rate_limit_fallback: Duration::from_secs(cfg.rate_limit_fallback_secs),
        }
    }

    async fn attempt_send(&self, token: &str, channel_id: &str, content: &str) -> AttemptOutcome {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, token)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => return AttemptOutcome::Transient(format!("request failed: {e:#}")),
        };

        match response.status() {
            StatusCode::OK => AttemptOutcome::Delivered,
            StatusCode::UNAUTHORIZED => AttemptOutcome::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => {
                let header = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok());
                AttemptOutcome::RateLimited(parse_retry_after(header, self.rate_limit_fallback))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                AttemptOutcome::Transient(format!("HTTP {status}: {body}"))
            }
        }
    }
}

/// Parse a `Retry-After` header value into a wait duration.
///
/// Servers are not trusted here: a missing, unparseable, negative, infinite,
/// or absurdly large value all fall back to the configured default rather
/// than poisoning the posting task.
fn parse_retry_after(header: Option<&str>, fallback: Duration) -> Duration {
    header
        .and_then(|s| s.parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(fallback)
}

#[async_trait]
impl Gateway for DiscordGateway {
    async fn validate_token(&self, token: &str) -> bool {
        let url = format!("{}/users/@me", self.api_base);
        match self.client.get(url).header(AUTHORIZATION, token).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(_) => false,
        }
    }

    async fn send_message(&self, token: &str, channel_id: &str, content: &str) -> bool {
        // Invalid tokens fail before any delivery attempt is spent.
        if !self.validate_token(token).await {
            error!(channel_id, "token invalid, not attempting delivery");
            return false;
        }

        let delivered = drive_send(self.max_retries, || {
            self.attempt_send(token, channel_id, content)
        })
        .await;

        if delivered {
            info!(channel_id, "message delivered");
        } else {
            error!(channel_id, "delivery failed after retries");
        }
        delivered
    }
}
