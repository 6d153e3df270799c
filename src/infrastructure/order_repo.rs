use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    check_transition, OrderId, OrderLine, OrderStatus, OutboxEvent, PendingOrder, Resolution,
};
use crate::domain::ports::OrderRepository;
use crate::domain::session::SessionId;
use crate::schema::{order_outbox, pending_order_lines, pending_orders};

use super::models::{OutboxEventRow, PendingOrderLineRow, PendingOrderRow};

fn to_domain(
    row: PendingOrderRow,
    lines: Vec<PendingOrderLineRow>,
) -> Result<PendingOrder, DomainError> {
    Ok(PendingOrder {
        order_id: OrderId::from(row.order_id),
        session_id: SessionId::parse(&row.session_id)?,
        lines: lines
            .into_iter()
            .map(|l| OrderLine {
                product_id: l.product_id,
                external_id: l.external_id,
                product_name: l.product_name,
                quantity: l.quantity,
                unit_price: l.unit_price,
            })
            .collect(),
        total: row.total,
        status: row.status.parse()?,
        reason: row.reason,
        created_at: row.created_at,
        resolved_at: row.resolved_at,
    })
}

fn outbox_row(event: OutboxEvent) -> OutboxEventRow {
    OutboxEventRow {
        id: event.id,
        aggregate_type: event.aggregate_type,
        aggregate_id: event.aggregate_id,
        event_type: event.event_type,
        payload: event.payload,
        created_at: event.created_at,
    }
}

fn load_lines(
    conn: &mut PgConnection,
    order_id: &str,
) -> Result<Vec<PendingOrderLineRow>, DomainError> {
    Ok(pending_order_lines::table
        .filter(pending_order_lines::order_id.eq(order_id))
        .order(pending_order_lines::position.asc())
        .select(PendingOrderLineRow::as_select())
        .load(conn)?)
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn insert(&self, order: &PendingOrder) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // 1. Insert the order header
            diesel::insert_into(pending_orders::table)
                .values(&PendingOrderRow {
                    order_id: order.order_id.to_string(),
                    session_id: order.session_id.to_string(),
                    total: order.total.clone(),
                    status: order.status.as_str().to_string(),
                    reason: order.reason.clone(),
                    created_at: order.created_at,
                    resolved_at: order.resolved_at,
                })
                .execute(conn)?;

            // 2. Insert the line snapshot, keeping cart order
            let lines: Vec<PendingOrderLineRow> = order
                .lines
                .iter()
                .zip(0..)
                .map(|(l, position)| PendingOrderLineRow {
                    id: Uuid::new_v4(),
                    order_id: order.order_id.to_string(),
                    position,
                    product_id: l.product_id,
                    external_id: l.external_id.clone(),
                    product_name: l.product_name.clone(),
                    quantity: l.quantity,
                    unit_price: l.unit_price.clone(),
                })
                .collect();
            diesel::insert_into(pending_order_lines::table)
                .values(&lines)
                .execute(conn)?;

            // 3. Outbox event in the same transaction
            diesel::insert_into(order_outbox::table)
                .values(&outbox_row(OutboxEvent::for_order(order)))
                .execute(conn)?;

            Ok(())
        })
    }

    fn find_by_id(&self, order_id: &OrderId) -> Result<Option<PendingOrder>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = pending_orders::table
            .find(order_id.as_str())
            .select(PendingOrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = load_lines(&mut conn, &order.order_id)?;
        to_domain(order, lines).map(Some)
    }

    fn list_for_session(
        &self,
        session: &SessionId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<PendingOrder>, DomainError> {
        let mut conn = self.pool.get()?;

        let mut query = pending_orders::table
            .filter(pending_orders::session_id.eq(session.as_str()))
            .select(PendingOrderRow::as_select())
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(pending_orders::status.eq(status.as_str()));
        }
        let rows = query
            .order(pending_orders::created_at.desc())
            .load(&mut conn)?;

        let ids: Vec<&str> = rows.iter().map(|r| r.order_id.as_str()).collect();
        let mut lines_by_order: HashMap<String, Vec<PendingOrderLineRow>> = HashMap::new();
        for line in pending_order_lines::table
            .filter(pending_order_lines::order_id.eq_any(ids))
            .order(pending_order_lines::position.asc())
            .select(PendingOrderLineRow::as_select())
            .load(&mut conn)?
        {
            lines_by_order
                .entry(line.order_id.clone())
                .or_default()
                .push(line);
        }

        rows.into_iter()
            .map(|row| {
                let lines = lines_by_order.remove(&row.order_id).unwrap_or_default();
                to_domain(row, lines)
            })
            .collect()
    }

    fn set_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<Resolution, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row lock serialises concurrent callbacks and the sweeper.
            let row = pending_orders::table
                .find(order_id.as_str())
                .select(PendingOrderRow::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or_else(|| DomainError::OrderNotFound(order_id.clone()))?;

            let current: OrderStatus = row.status.parse()?;
            if !check_transition(order_id, current, status)? {
                let lines = load_lines(conn, &row.order_id)?;
                return Ok(Resolution::Unchanged(to_domain(row, lines)?));
            }

            let updated = diesel::update(pending_orders::table.find(order_id.as_str()))
                .set((
                    pending_orders::status.eq(status.as_str()),
                    pending_orders::reason.eq(reason),
                    pending_orders::resolved_at.eq(Some(at)),
                ))
                .returning(PendingOrderRow::as_returning())
                .get_result(conn)?;

            let lines = load_lines(conn, &updated.order_id)?;
            let order = to_domain(updated, lines)?;

            diesel::insert_into(order_outbox::table)
                .values(&outbox_row(OutboxEvent::for_order(&order)))
                .execute(conn)?;

            Ok(Resolution::Applied(order))
        })
    }

    fn pending_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<OrderId>, DomainError> {
        let mut conn = self.pool.get()?;
        let ids: Vec<String> = pending_orders::table
            .filter(pending_orders::status.eq(OrderStatus::Pending.as_str()))
            .filter(pending_orders::created_at.lt(cutoff))
            .select(pending_orders::order_id)
            .load(&mut conn)?;
        Ok(ids.into_iter().map(OrderId::from).collect())
    }

    fn events(&self, order_id: &OrderId) -> Result<Vec<OutboxEvent>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = order_outbox::table
            .filter(order_outbox::aggregate_id.eq(order_id.as_str()))
            .order(order_outbox::created_at.asc())
            .select(OutboxEventRow::as_select())
            .load(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|r| OutboxEvent {
                id: r.id,
                aggregate_type: r.aggregate_type,
                aggregate_id: r.aggregate_id,
                event_type: r.event_type,
                payload: r.payload,
                created_at: r.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::DieselOrderRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{OrderId, OrderLine, OrderStatus, PendingOrder};
    use crate::domain::ports::OrderRepository;
    use crate::domain::session::SessionId;
    use crate::infrastructure::test_db::setup_db;

    fn make_order(session: &str) -> PendingOrder {
        PendingOrder::snapshot(
            SessionId::parse(session).expect("valid session"),
            vec![
                OrderLine {
                    product_id: Uuid::new_v4(),
                    external_id: "1".to_string(),
                    product_name: "MacBook Pro M3".to_string(),
                    quantity: 2,
                    unit_price: BigDecimal::from_str("1999.99").expect("valid decimal"),
                },
                OrderLine {
                    product_id: Uuid::new_v4(),
                    external_id: "2".to_string(),
                    product_name: "Dell XPS 15".to_string(),
                    quantity: 1,
                    unit_price: BigDecimal::from_str("1599.99").expect("valid decimal"),
                },
            ],
        )
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn insert_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);
        let order = make_order("s1");

        repo.insert(&order).expect("insert failed");
        let found = repo
            .find_by_id(&order.order_id)
            .expect("find failed")
            .expect("order should exist");

        assert_eq!(found.status, OrderStatus::Pending);
        assert_eq!(found.total, order.total);
        assert_eq!(found.lines.len(), 2);
        assert_eq!(found.lines[0].external_id, "1");
        assert_eq!(found.lines[1].external_id, "2");
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn insert_writes_outbox_event_in_same_transaction() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);
        let order = make_order("s1");

        repo.insert(&order).expect("insert failed");
        let events = repo.events(&order.order_id).expect("events failed");

        assert_eq!(events.len(), 1, "exactly one outbox event per new order");
        assert_eq!(events[0].aggregate_type, "PendingOrder");
        assert_eq!(events[0].event_type, "OrderCreated");
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn set_status_is_one_shot() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);
        let order = make_order("s1");
        repo.insert(&order).expect("insert failed");

        let applied = repo
            .set_status(&order.order_id, OrderStatus::Confirmed, None, Utc::now())
            .expect("confirm failed");
        assert!(applied.is_applied());
        assert_eq!(applied.order().status, OrderStatus::Confirmed);

        let again = repo
            .set_status(&order.order_id, OrderStatus::Confirmed, None, Utc::now())
            .expect("repeat failed");
        assert!(!again.is_applied());

        let flipped = repo.set_status(
            &order.order_id,
            OrderStatus::Rejected,
            Some("late".to_string()),
            Utc::now(),
        );
        assert!(matches!(flipped, Err(DomainError::AlreadyResolved { .. })));
        assert_eq!(repo.events(&order.order_id).expect("events failed").len(), 2);
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn set_status_unknown_order_is_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);

        let result = repo.set_status(
            &OrderId::from("ORD-0-missing"),
            OrderStatus::Rejected,
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::OrderNotFound(_))));
    }

    #[tokio::test]
    #[ignore = "requires a container runtime for Postgres"]
    async fn list_and_stale_queries_filter_by_status() {
        let (_container, pool) = setup_db().await;
        let repo = DieselOrderRepository::new(pool);
        let first = make_order("s1");
        let second = make_order("s1");
        repo.insert(&first).expect("insert failed");
        repo.insert(&second).expect("insert failed");
        repo.insert(&make_order("s2")).expect("insert failed");
        repo.set_status(&first.order_id, OrderStatus::Rejected, None, Utc::now())
            .expect("reject failed");

        let session = SessionId::parse("s1").expect("valid session");
        assert_eq!(repo.list_for_session(&session, None).expect("list").len(), 2);
        let pending = repo
            .list_for_session(&session, Some(OrderStatus::Pending))
            .expect("list");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].order_id, second.order_id);
        assert_eq!(pending[0].lines.len(), 2);

        let stale = repo
            .pending_created_before(Utc::now() + Duration::seconds(1))
            .expect("stale query");
        assert_eq!(stale.len(), 2);
        assert!(repo
            .pending_created_before(Utc::now() - Duration::hours(1))
            .expect("stale query")
            .is_empty());
    }
}
