//! Client side of the status protocol: read an order until it is terminal.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::time::{sleep, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Confirmed,
    Rejected(Option<String>),
    /// The client-side deadline passed while the order was still pending.
    TimedOut,
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Order {0} not found")]
    NotFound(String),
    #[error("Unexpected status {status} while polling order {order_id}")]
    Unexpected { order_id: String, status: u16 },
    #[error("Unknown order status '{0}'")]
    UnknownStatus(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct OrderStatusBody {
    status: String,
    reason: Option<String>,
}

/// Polls `GET {base_url}/orders/{order_id}`.
#[derive(Clone)]
pub struct OrderStatusPoller {
    http: reqwest::Client,
    base_url: String,
}

impl OrderStatusPoller {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Read the order once. `None` means it is still pending.
    pub async fn poll_once(&self, order_id: &str) -> Result<Option<PollOutcome>, PollError> {
        let url = format!("{}/orders/{}", self.base_url, order_id);
        let response = self.http.get(&url).send().await?;

        match response.status() {
            s if s.is_success() => {}
            reqwest::StatusCode::NOT_FOUND => return Err(PollError::NotFound(order_id.to_string())),
            s => {
                return Err(PollError::Unexpected {
                    order_id: order_id.to_string(),
                    status: s.as_u16(),
                })
            }
        }

        let body: OrderStatusBody = response.json().await?;
        match body.status.as_str() {
            "pending" => Ok(None),
            "confirmed" => Ok(Some(PollOutcome::Confirmed)),
            "rejected" => Ok(Some(PollOutcome::Rejected(body.reason))),
            other => Err(PollError::UnknownStatus(other.to_string())),
        }
    }

    /// Poll every `interval` until the order is terminal or `timeout` has
    /// elapsed. The order itself is never modified by a timeout.
    pub async fn wait_for_resolution(
        &self,
        order_id: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<PollOutcome, PollError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(outcome) = self.poll_once(order_id).await? {
                return Ok(outcome);
            }
            if Instant::now() + interval > deadline {
                log::info!("Gave up waiting for order {} after {:?}", order_id, timeout);
                return Ok(PollOutcome::TimedOut);
            }
            sleep(interval).await;
        }
    }
}
