use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::CartLine;
use super::errors::DomainError;
use super::order::{OrderId, OrderStatus, OutboxEvent, PendingOrder, Resolution};
use super::product::{NewProduct, Product};
use super::session::SessionId;

pub trait ProductRepository: Send + Sync + 'static {
    fn list(&self) -> Result<Vec<Product>, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn insert(&self, product: NewProduct) -> Result<Product, DomainError>;
    fn set_price(&self, id: Uuid, price: BigDecimal) -> Result<Option<Product>, DomainError>;
    fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

pub trait CartRepository: Send + Sync + 'static {
    fn lines_for_session(&self, session: &SessionId) -> Result<Vec<CartLine>, DomainError>;
    /// Add `quantity` of `product_id`, incrementing the existing line if any.
    fn add(
        &self,
        session: &SessionId,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError>;
    fn set_quantity(
        &self,
        session: &SessionId,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError>;
    fn remove(&self, session: &SessionId, line_id: Uuid) -> Result<bool, DomainError>;
    fn clear(&self, session: &SessionId) -> Result<usize, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Persist a new order together with its `OrderCreated` outbox event.
    fn insert(&self, order: &PendingOrder) -> Result<(), DomainError>;
    fn find_by_id(&self, order_id: &OrderId) -> Result<Option<PendingOrder>, DomainError>;
    fn list_for_session(
        &self,
        session: &SessionId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<PendingOrder>, DomainError>;
    /// Move a pending order into a terminal status, recording an outbox event
    /// when the status actually changes.
    fn set_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Resolution, DomainError>;
    /// Identifiers of orders still pending that were created before `cutoff`.
    fn pending_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<OrderId>, DomainError>;
    fn events(&self, order_id: &OrderId) -> Result<Vec<OutboxEvent>, DomainError>;
}
