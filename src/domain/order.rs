use std::fmt;
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::session::SessionId;

/// Globally unique order identifier, `ORD-<unix millis>-<random suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "ORD-{}-{}",
            Utc::now().timestamp_millis(),
            &suffix[..12]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for OrderId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    /// Status a warehouse stock answer resolves to.
    pub fn from_stock(has_stock: bool) -> Self {
        if has_stock {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Rejected
        }
    }

    /// Name of the outbox event recording a move into this status.
    pub fn event_type(self) -> &'static str {
        match self {
            OrderStatus::Pending => "OrderCreated",
            OrderStatus::Confirmed => "OrderConfirmed",
            OrderStatus::Rejected => "OrderRejected",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// One line of the cart as it was when the order was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub external_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl OrderLine {
    pub fn subtotal(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrder {
    pub order_id: OrderId,
    pub session_id: SessionId,
    pub lines: Vec<OrderLine>,
    pub total: BigDecimal,
    pub status: OrderStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PendingOrder {
    /// Freeze `lines` into a new `pending` order with a fresh identifier.
    pub fn snapshot(session_id: SessionId, lines: Vec<OrderLine>) -> Self {
        let total = order_total(&lines);
        Self {
            order_id: OrderId::generate(),
            session_id,
            lines,
            total,
            status: OrderStatus::Pending,
            reason: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }
}

pub fn order_total(lines: &[OrderLine]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::zero(), |acc, line| acc + line.subtotal())
}

/// Outcome of asking the store to move an order into a terminal status.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The order was pending and now carries the requested status.
    Applied(PendingOrder),
    /// The order already carried the requested status; nothing changed.
    Unchanged(PendingOrder),
}

impl Resolution {
    pub fn order(&self) -> &PendingOrder {
        match self {
            Resolution::Applied(order) | Resolution::Unchanged(order) => order,
        }
    }

    pub fn into_order(self) -> PendingOrder {
        match self {
            Resolution::Applied(order) | Resolution::Unchanged(order) => order,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Resolution::Applied(_))
    }
}

/// Decide what a request to move `current` into `requested` amounts to.
///
/// Only `pending -> confirmed` and `pending -> rejected` change state; asking
/// for the status the order already has is a no-op, anything else is refused.
pub fn check_transition(
    order_id: &OrderId,
    current: OrderStatus,
    requested: OrderStatus,
) -> Result<bool, DomainError> {
    if !requested.is_terminal() {
        return Err(DomainError::InvalidInput(
            "orders can only be moved to confirmed or rejected".to_string(),
        ));
    }
    if current == requested {
        return Ok(false);
    }
    if current.is_terminal() {
        return Err(DomainError::AlreadyResolved {
            order_id: order_id.clone(),
            status: current,
        });
    }
    Ok(true)
}

#[derive(Debug, Clone)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

pub const ORDER_AGGREGATE: &str = "PendingOrder";

impl OutboxEvent {
    /// Event recording that `order` entered its current status.
    pub fn for_order(order: &PendingOrder) -> Self {
        let lines: Vec<serde_json::Value> = order
            .lines
            .iter()
            .map(|l| {
                serde_json::json!({
                    "product_id": l.product_id,
                    "external_id": l.external_id,
                    "quantity": l.quantity,
                    "unit_price": l.unit_price.to_string(),
                })
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            aggregate_type: ORDER_AGGREGATE.to_string(),
            aggregate_id: order.order_id.to_string(),
            event_type: order.status.event_type().to_string(),
            payload: serde_json::json!({
                "order_id": order.order_id,
                "session_id": order.session_id,
                "status": order.status,
                "reason": order.reason,
                "total": order.total.to_string(),
                "lines": lines,
            }),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use super::*;

    fn line(price: &str, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: Uuid::new_v4(),
            external_id: "1".to_string(),
            product_name: "Widget".to_string(),
            quantity,
            unit_price: BigDecimal::from_str(price).expect("valid decimal"),
        }
    }

    #[test]
    fn order_ids_are_distinct_across_many_calls() {
        let ids: HashSet<OrderId> = (0..10_000).map(|_| OrderId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn order_id_has_expected_shape() {
        let id = OrderId::generate();
        let parts: Vec<&str> = id.as_str().splitn(3, '-').collect();
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 12);
    }

    #[test]
    fn total_sums_price_times_quantity() {
        let lines = vec![line("1999.99", 2), line("1599.99", 1)];
        assert_eq!(
            order_total(&lines),
            BigDecimal::from_str("5599.97").expect("valid decimal")
        );
    }

    #[test]
    fn snapshot_starts_pending() {
        let session = SessionId::parse("s1").expect("valid session");
        let order = PendingOrder::snapshot(session, vec![line("10.00", 3)]);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, BigDecimal::from(30));
        assert!(order.resolved_at.is_none());
    }

    #[test]
    fn status_strings_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Rejected,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()).expect("parses"), status);
        }
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn stock_answer_maps_to_terminal_status() {
        assert_eq!(OrderStatus::from_stock(true), OrderStatus::Confirmed);
        assert_eq!(OrderStatus::from_stock(false), OrderStatus::Rejected);
    }

    #[test]
    fn pending_can_move_to_either_terminal_status() {
        let id = OrderId::from("ORD-1-a");
        assert!(check_transition(&id, OrderStatus::Pending, OrderStatus::Confirmed).expect("ok"));
        assert!(check_transition(&id, OrderStatus::Pending, OrderStatus::Rejected).expect("ok"));
    }

    #[test]
    fn repeating_terminal_status_is_a_no_op() {
        let id = OrderId::from("ORD-1-a");
        assert!(!check_transition(&id, OrderStatus::Confirmed, OrderStatus::Confirmed).expect("ok"));
    }

    #[test]
    fn terminal_status_cannot_flip() {
        let id = OrderId::from("ORD-1-a");
        let err = check_transition(&id, OrderStatus::Confirmed, OrderStatus::Rejected)
            .expect_err("must refuse");
        assert!(matches!(
            err,
            DomainError::AlreadyResolved {
                status: OrderStatus::Confirmed,
                ..
            }
        ));
    }

    #[test]
    fn cannot_move_back_to_pending() {
        let id = OrderId::from("ORD-1-a");
        assert!(matches!(
            check_transition(&id, OrderStatus::Pending, OrderStatus::Pending),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn outbox_event_names_follow_status() {
        let session = SessionId::parse("s1").expect("valid session");
        let mut order = PendingOrder::snapshot(session, vec![line("2.50", 2)]);
        assert_eq!(OutboxEvent::for_order(&order).event_type, "OrderCreated");
        order.status = OrderStatus::Rejected;
        let event = OutboxEvent::for_order(&order);
        assert_eq!(event.event_type, "OrderRejected");
        assert_eq!(event.aggregate_id, order.order_id.to_string());
        assert_eq!(event.payload["status"], "rejected");
        assert_eq!(event.payload["total"], "5.00");
    }
}
