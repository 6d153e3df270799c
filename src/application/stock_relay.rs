use serde_json::Value;

use crate::domain::order::{OrderId, PendingOrder};
use crate::domain::session::SessionId;
use crate::infrastructure::warehouse_client::{RelayError, StockCheckRequest, WarehouseClient};

#[derive(Debug, Clone)]
pub struct StockCheckItem {
    pub external_id: String,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub order_id: OrderId,
    pub session_id: SessionId,
    pub items: Vec<StockCheckItem>,
    pub callback_url: String,
}

impl RelayRequest {
    pub fn for_order(order: &PendingOrder, callback_url: String) -> Self {
        Self {
            order_id: order.order_id.clone(),
            session_id: order.session_id.clone(),
            items: order
                .lines
                .iter()
                .map(|l| StockCheckItem {
                    external_id: l.external_id.clone(),
                    quantity: l.quantity,
                })
                .collect(),
            callback_url,
        }
    }
}

/// Forwards an order's lines to the warehouse, one request per line.
#[derive(Clone)]
pub struct StockRelay {
    warehouse: WarehouseClient,
}

impl StockRelay {
    pub fn new(warehouse: WarehouseClient) -> Self {
        Self { warehouse }
    }

    /// Check every item in order and return the warehouse bodies in the same
    /// order. The first failure aborts the remaining checks; the order itself
    /// is left as it is.
    pub async fn relay(&self, request: &RelayRequest) -> Result<Vec<Value>, RelayError> {
        let Some(endpoint) = self.warehouse.endpoint() else {
            log::error!(
                "Cannot verify stock for order {}: no warehouse endpoint configured",
                request.order_id
            );
            return Err(RelayError::NotConfigured);
        };

        log::info!(
            "Relaying {} stock checks for order {} (session {}) to {}; callback {}",
            request.items.len(),
            request.order_id,
            request.session_id,
            endpoint,
            request.callback_url
        );

        let mut responses = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let check = StockCheckRequest {
                product_id: &item.external_id,
                quantity: item.quantity,
            };
            match self.warehouse.check_stock(&check).await {
                Ok(body) => {
                    log::info!(
                        "Warehouse accepted check for product {} on order {}",
                        item.external_id,
                        request.order_id
                    );
                    responses.push(body);
                }
                Err(e) => {
                    log::error!("Stock relay for order {} failed: {}", request.order_id, e);
                    return Err(e);
                }
            }
        }

        Ok(responses)
    }
}
