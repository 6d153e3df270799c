use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::errors::DomainError;
use crate::domain::order::{
    OrderId, OrderLine, OrderStatus, OutboxEvent, PendingOrder, Resolution,
};
use crate::domain::ports::{CartRepository, OrderRepository, ProductRepository};
use crate::domain::session::SessionId;

pub const DEFAULT_REJECTION_REASON: &str = "Insufficient stock";
pub const TIMEOUT_REJECTION_REASON: &str = "Stock confirmation timed out";

/// Drives a checkout through the pending-order protocol: cart snapshot,
/// warehouse answer, cart cleanup.
#[derive(Clone)]
pub struct OrderService {
    products: Arc<dyn ProductRepository>,
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl OrderService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            products,
            carts,
            orders,
        }
    }

    /// Snapshot the session's cart into a new `pending` order.
    ///
    /// Prices are copied from the catalog now; later catalog changes never
    /// reach the stored order. Nothing is persisted when any line fails to
    /// resolve.
    pub fn create_pending_order(&self, session: &SessionId) -> Result<PendingOrder, DomainError> {
        let cart = self.carts.lines_for_session(session)?;
        if cart.is_empty() {
            return Err(DomainError::CartEmpty);
        }

        let mut lines = Vec::with_capacity(cart.len());
        for item in &cart {
            let product = self
                .products
                .find_by_id(item.product_id)?
                .ok_or(DomainError::ProductNotFound(item.product_id))?;
            let external_id = product.external_id.ok_or_else(|| {
                DomainError::InvalidInput(format!(
                    "product {} has no warehouse identifier",
                    product.id
                ))
            })?;
            lines.push(OrderLine {
                product_id: product.id,
                external_id,
                product_name: product.name,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let order = PendingOrder::snapshot(session.clone(), lines);
        self.orders.insert(&order)?;
        log::info!(
            "Created pending order {} for session {} ({} lines, total {})",
            order.order_id,
            session,
            order.lines.len(),
            order.total
        );
        Ok(order)
    }

    pub fn get_order(&self, order_id: &OrderId) -> Result<PendingOrder, DomainError> {
        self.orders
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::OrderNotFound(order_id.clone()))
    }

    pub fn list_orders(
        &self,
        session: &SessionId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<PendingOrder>, DomainError> {
        self.orders.list_for_session(session, status)
    }

    pub fn order_events(&self, order_id: &OrderId) -> Result<Vec<OutboxEvent>, DomainError> {
        self.get_order(order_id)?;
        self.orders.events(order_id)
    }

    /// Move an order into a terminal status. Confirming an order empties the
    /// cart of the order's session; repeating the status it already has
    /// changes nothing.
    pub fn set_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        reason: Option<String>,
    ) -> Result<Resolution, DomainError> {
        let resolution = self.orders.set_status(order_id, status, reason, Utc::now())?;

        match &resolution {
            Resolution::Applied(order) => {
                log::info!("Order {} is now {}", order.order_id, order.status);
                if order.status == OrderStatus::Confirmed {
                    let cleared = self.carts.clear(&order.session_id)?;
                    log::info!(
                        "Cleared {} cart lines for session {}",
                        cleared,
                        order.session_id
                    );
                }
            }
            Resolution::Unchanged(order) => {
                log::info!(
                    "Order {} already {}; ignoring repeated update",
                    order.order_id,
                    order.status
                );
            }
        }

        Ok(resolution)
    }

    /// Apply a warehouse stock answer to the order it names.
    pub fn apply_stock_answer(
        &self,
        order_id: &OrderId,
        claimed_session: &str,
        has_stock: bool,
        message: Option<String>,
    ) -> Result<Resolution, DomainError> {
        let order = self.get_order(order_id)?;
        if order.session_id.as_str() != claimed_session {
            log::warn!(
                "Stock answer for order {} names session {} but the order belongs to {}",
                order_id,
                claimed_session,
                order.session_id
            );
        }

        let status = OrderStatus::from_stock(has_stock);
        let reason = match status {
            OrderStatus::Rejected => {
                Some(message.unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()))
            }
            _ => message,
        };
        self.set_order_status(order_id, status, reason)
    }

    /// Reject every order that has been pending for longer than `max_age`.
    /// Returns the identifiers that were rejected by this call.
    pub fn expire_stale_orders(&self, max_age: Duration) -> Result<Vec<OrderId>, DomainError> {
        let cutoff = Utc::now() - max_age;
        let mut expired = Vec::new();

        for order_id in self.orders.pending_created_before(cutoff)? {
            match self.set_order_status(
                &order_id,
                OrderStatus::Rejected,
                Some(TIMEOUT_REJECTION_REASON.to_string()),
            ) {
                Ok(resolution) if resolution.is_applied() => expired.push(order_id),
                Ok(_) => {}
                // The warehouse answered between the query and the update.
                Err(DomainError::AlreadyResolved { .. }) => {
                    log::debug!("Order {} resolved before expiry", order_id);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(expired)
    }
}
