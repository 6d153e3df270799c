//! Lock-guarded in-memory repositories.
//!
//! Each repository is a cheap handle over `Arc<RwLock<..>>`; clones share the
//! same storage. Used by the HTTP and service tests, and usable as a
//! database-less backend for local demos.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::cart::CartLine;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    check_transition, OrderId, OrderStatus, OutboxEvent, PendingOrder, Resolution,
};
use crate::domain::ports::{CartRepository, OrderRepository, ProductRepository};
use crate::domain::product::{NewProduct, Product};
use crate::domain::session::SessionId;

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, DomainError> {
    lock.read()
        .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, DomainError> {
    lock.write()
        .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
}

// ── Products ─────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn list(&self) -> Result<Vec<Product>, DomainError> {
        Ok(read(&self.products)?.clone())
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        Ok(read(&self.products)?.iter().find(|p| p.id == id).cloned())
    }

    fn insert(&self, product: NewProduct) -> Result<Product, DomainError> {
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
            category: product.category,
            is_new: product.is_new,
            external_id: product.external_id,
            created_at: Utc::now(),
        };
        write(&self.products)?.push(product.clone());
        Ok(product)
    }

    fn set_price(&self, id: Uuid, price: BigDecimal) -> Result<Option<Product>, DomainError> {
        let mut products = write(&self.products)?;
        Ok(products.iter_mut().find(|p| p.id == id).map(|p| {
            p.price = price;
            p.clone()
        }))
    }

    fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut products = write(&self.products)?;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() != before)
    }
}

// ── Cart ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryCartRepository {
    lines: Arc<RwLock<Vec<CartLine>>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartRepository for InMemoryCartRepository {
    fn lines_for_session(&self, session: &SessionId) -> Result<Vec<CartLine>, DomainError> {
        Ok(read(&self.lines)?
            .iter()
            .filter(|l| &l.session_id == session)
            .cloned()
            .collect())
    }

    fn add(
        &self,
        session: &SessionId,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartLine, DomainError> {
        let mut lines = write(&self.lines)?;
        if let Some(line) = lines
            .iter_mut()
            .find(|l| &l.session_id == session && l.product_id == product_id)
        {
            line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                DomainError::InvalidInput(format!(
                    "quantity overflow for product {product_id} in the cart"
                ))
            })?;
            return Ok(line.clone());
        }
        let line = CartLine {
            id: Uuid::new_v4(),
            session_id: session.clone(),
            product_id,
            quantity,
            added_at: Utc::now(),
        };
        lines.push(line.clone());
        Ok(line)
    }

    fn set_quantity(
        &self,
        session: &SessionId,
        line_id: Uuid,
        quantity: i32,
    ) -> Result<Option<CartLine>, DomainError> {
        let mut lines = write(&self.lines)?;
        Ok(lines
            .iter_mut()
            .find(|l| l.id == line_id && &l.session_id == session)
            .map(|l| {
                l.quantity = quantity;
                l.clone()
            }))
    }

    fn remove(&self, session: &SessionId, line_id: Uuid) -> Result<bool, DomainError> {
        let mut lines = write(&self.lines)?;
        let before = lines.len();
        lines.retain(|l| !(l.id == line_id && &l.session_id == session));
        Ok(lines.len() != before)
    }

    fn clear(&self, session: &SessionId) -> Result<usize, DomainError> {
        let mut lines = write(&self.lines)?;
        let before = lines.len();
        lines.retain(|l| &l.session_id != session);
        Ok(before - lines.len())
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct OrderTables {
    orders: HashMap<OrderId, PendingOrder>,
    outbox: Vec<OutboxEvent>,
}

#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    tables: Arc<RwLock<OrderTables>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: &PendingOrder) -> Result<(), DomainError> {
        let mut tables = write(&self.tables)?;
        if tables.orders.contains_key(&order.order_id) {
            return Err(DomainError::Internal(format!(
                "duplicate order id {}",
                order.order_id
            )));
        }
        tables.outbox.push(OutboxEvent::for_order(order));
        tables.orders.insert(order.order_id.clone(), order.clone());
        Ok(())
    }

    fn find_by_id(&self, order_id: &OrderId) -> Result<Option<PendingOrder>, DomainError> {
        Ok(read(&self.tables)?.orders.get(order_id).cloned())
    }

    fn list_for_session(
        &self,
        session: &SessionId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<PendingOrder>, DomainError> {
        let tables = read(&self.tables)?;
        let mut orders: Vec<PendingOrder> = tables
            .orders
            .values()
            .filter(|o| &o.session_id == session)
            .filter(|o| status.map_or(true, |s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn set_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Resolution, DomainError> {
        let mut tables = write(&self.tables)?;
        let order = tables
            .orders
            .get_mut(order_id)
            .ok_or_else(|| DomainError::OrderNotFound(order_id.clone()))?;

        if !check_transition(order_id, order.status, status)? {
            return Ok(Resolution::Unchanged(order.clone()));
        }

        order.status = status;
        order.reason = reason;
        order.resolved_at = Some(at);
        let resolved = order.clone();
        tables.outbox.push(OutboxEvent::for_order(&resolved));
        Ok(Resolution::Applied(resolved))
    }

    fn pending_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<OrderId>, DomainError> {
        Ok(read(&self.tables)?
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Pending && o.created_at < cutoff)
            .map(|o| o.order_id.clone())
            .collect())
    }

    fn events(&self, order_id: &OrderId) -> Result<Vec<OutboxEvent>, DomainError> {
        Ok(read(&self.tables)?
            .outbox
            .iter()
            .filter(|e| e.aggregate_id == order_id.as_str())
            .cloned()
            .collect())
    }
}
