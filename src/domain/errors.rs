use thiserror::Error;
use uuid::Uuid;

use super::order::{OrderId, OrderStatus};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Cart is empty")]
    CartEmpty,
    #[error("Product {0} not found")]
    ProductNotFound(Uuid),
    #[error("Cart line {0} not found")]
    CartLineNotFound(Uuid),
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} is already {status}")]
    AlreadyResolved {
        order_id: OrderId,
        status: OrderStatus,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
