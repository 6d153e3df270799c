use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Stock verification endpoint is not configured")]
    NotConfigured,
    #[error("Warehouse unreachable while checking product {product_id}: {source}")]
    Unreachable {
        product_id: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Warehouse answered {status} for product {product_id}: {body}")]
    Rejected {
        product_id: String,
        status: u16,
        body: String,
    },
}

/// Body of one outbound stock check. The warehouse accepts exactly one
/// product per request.
#[derive(Debug, Serialize)]
pub struct StockCheckRequest<'a> {
    pub product_id: &'a str,
    pub quantity: i32,
}

/// HTTP client for the external stock-verification endpoint.
#[derive(Clone)]
pub struct WarehouseClient {
    http: reqwest::Client,
    endpoint: Option<String>,
}

impl WarehouseClient {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// POST one `{product_id, quantity}` check. Any 2xx body is returned
    /// as-is (parsed as JSON when possible), anything else is an error.
    pub async fn check_stock(&self, request: &StockCheckRequest<'_>) -> Result<Value, RelayError> {
        let endpoint = self.endpoint.as_deref().ok_or(RelayError::NotConfigured)?;
        let unreachable = |source| RelayError::Unreachable {
            product_id: request.product_id.to_string(),
            source,
        };

        let response = self
            .http
            .post(endpoint)
            .json(request)
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        let body = response.text().await.map_err(unreachable)?;

        if !status.is_success() {
            return Err(RelayError::Rejected {
                product_id: request.product_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}
