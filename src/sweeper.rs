//! Background expiry of orders the warehouse never answered.
//!
//! Every tick, orders still `pending` after `max_age` are rejected with
//! [`TIMEOUT_REJECTION_REASON`](crate::application::order_service::TIMEOUT_REJECTION_REASON).
//! An order the warehouse resolves first is left alone.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::application::order_service::OrderService;
use crate::domain::errors::DomainError;
use crate::domain::order::OrderId;

#[derive(Clone)]
pub struct PendingOrderSweeper {
    orders: OrderService,
    max_age: Duration,
    interval: Duration,
}

impl PendingOrderSweeper {
    pub fn new(orders: OrderService, max_age: Duration, interval: Duration) -> Self {
        Self {
            orders,
            max_age,
            interval,
        }
    }

    /// Run a single pass on the blocking pool and return the expired ids.
    pub async fn sweep_once(&self) -> Result<Vec<OrderId>, DomainError> {
        let orders = self.orders.clone();
        let max_age = chrono::Duration::from_std(self.max_age)
            .map_err(|e| DomainError::Internal(format!("order timeout out of range: {e}")))?;

        tokio::task::spawn_blocking(move || orders.expire_stale_orders(max_age))
            .await
            .map_err(|e| DomainError::Internal(format!("sweeper task failed: {e}")))?
    }

    /// Sweep forever on `interval`. Failed passes are logged and retried on
    /// the next tick.
    pub fn spawn(self) -> JoinHandle<()> {
        log::info!(
            "Pending-order sweeper running every {:?}, expiring after {:?}",
            self.interval,
            self.max_age
        );

        tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match self.sweep_once().await {
                    Ok(expired) if expired.is_empty() => {
                        log::debug!("Sweeper found no stale pending orders");
                    }
                    Ok(expired) => {
                        for order_id in &expired {
                            log::info!("Order {} expired waiting for stock confirmation", order_id);
                        }
                    }
                    Err(e) => log::error!("Pending-order sweep failed: {}", e),
                }
            }
        })
    }
}
