use std::str::FromStr;

use actix_web::{web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::session_from_path;
use crate::application::stock_relay::{RelayRequest, StockCheckItem};
use crate::domain::order::{OrderId, OrderLine, OrderStatus, OutboxEvent, PendingOrder};
use crate::domain::session::SessionId;
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub product_id: Uuid,
    pub external_id: String,
    pub product_name: String,
    pub quantity: i32,
    /// Price captured when the order was placed
    pub unit_price: String,
    pub subtotal: String,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(l: OrderLine) -> Self {
        Self {
            subtotal: l.subtotal().to_string(),
            product_id: l.product_id,
            external_id: l.external_id,
            product_name: l.product_name,
            quantity: l.quantity,
            unit_price: l.unit_price.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: String,
    pub session_id: String,
    /// One of `pending`, `confirmed`, `rejected`
    pub status: String,
    pub is_terminal: bool,
    pub reason: Option<String>,
    pub total: String,
    pub lines: Vec<OrderLineResponse>,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

impl From<PendingOrder> for OrderResponse {
    fn from(o: PendingOrder) -> Self {
        Self {
            order_id: o.order_id.to_string(),
            session_id: o.session_id.to_string(),
            status: o.status.to_string(),
            is_terminal: o.status.is_terminal(),
            reason: o.reason,
            total: o.total.to_string(),
            lines: o.lines.into_iter().map(OrderLineResponse::from).collect(),
            created_at: o.created_at.to_rfc3339(),
            resolved_at: o.resolved_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderEventResponse {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    #[schema(value_type = Object)]
    pub payload: Value,
    pub created_at: String,
}

impl From<OutboxEvent> for OrderEventResponse {
    fn from(e: OutboxEvent) -> Self {
        Self {
            id: e.id,
            aggregate_type: e.aggregate_type,
            aggregate_id: e.aggregate_id,
            event_type: e.event_type,
            payload: e.payload,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Only return orders in this status
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: String,
    pub order: OrderResponse,
    /// Warehouse answers, one per order line, in line order
    #[schema(value_type = Vec<Object>)]
    pub warehouse_responses: Vec<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockVerificationItem {
    /// Warehouse identifier of the product
    pub external_id: String,
    pub quantity: i32,
}

/// Manual relay request for an order that was already created.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockVerificationRequest {
    pub order_id: String,
    pub session_id: String,
    pub products: Vec<StockVerificationItem>,
    /// Overrides the callback URL announced to the warehouse
    pub webhook_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockVerificationResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /sessions/{session_id}/orders
///
/// Freezes the session's cart into a pending order. The cart itself is left
/// alone until the warehouse confirms.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/orders",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 201, description = "Pending order created", body = OrderResponse),
        (status = 400, description = "Cart is empty or a product cannot be checked"),
        (status = 404, description = "A cart line references a deleted product"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = session_from_path(&path)?;
    let orders = state.orders.clone();
    let order = web::block(move || orders.create_pending_order(&session)).await??;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

#[utoipa::path(
    get,
    path = "/sessions/{session_id}/orders",
    params(
        ("session_id" = String, Path, description = "Session identifier"),
        ("status" = Option<String>, Query, description = "pending, confirmed or rejected"),
    ),
    responses(
        (status = 200, description = "Orders of the session, newest first", body = [OrderResponse]),
        (status = 400, description = "Unknown status filter"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let session = session_from_path(&path)?;
    let status = query
        .into_inner()
        .status
        .map(|s| OrderStatus::from_str(&s))
        .transpose()?;
    let orders = state.orders.clone();
    let found = web::block(move || orders.list_orders(&session, status)).await??;
    let body: Vec<OrderResponse> = found.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /sessions/{session_id}/checkout
///
/// Creates the pending order and relays its lines to the warehouse in one
/// call. When the relay fails the order stays pending and its id is part of
/// the error body.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/checkout",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 201, description = "Order created and sent to the warehouse", body = CheckoutResponse),
        (status = 400, description = "Cart is empty"),
        (status = 502, description = "Warehouse refused or could not be reached"),
        (status = 503, description = "No warehouse endpoint configured"),
    ),
    tag = "orders"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = session_from_path(&path)?;
    let orders = state.orders.clone();
    let order = web::block(move || orders.create_pending_order(&session)).await??;

    let request = RelayRequest::for_order(&order, state.callback_url.clone());
    match state.relay.relay(&request).await {
        Ok(warehouse_responses) => Ok(HttpResponse::Created().json(CheckoutResponse {
            success: true,
            message: "Order created and sent for stock verification".to_string(),
            order: OrderResponse::from(order),
            warehouse_responses,
        })),
        Err(e) => {
            let err = AppError::from(e);
            Ok(HttpResponse::build(err.status_code()).json(json!({
                "success": false,
                "message": err.to_string(),
                "order_id": order.order_id,
                "status": order.status,
            })))
        }
    }
}

/// POST /stock-verification
///
/// Relays an existing order's lines to the warehouse, one request per line.
#[utoipa::path(
    post,
    path = "/stock-verification",
    request_body = StockVerificationRequest,
    responses(
        (status = 200, description = "Every line accepted by the warehouse", body = StockVerificationResponse),
        (status = 400, description = "Invalid session id or quantity"),
        (status = 502, description = "Warehouse refused or could not be reached"),
        (status = 503, description = "No warehouse endpoint configured"),
    ),
    tag = "orders"
)]
pub async fn verify_stock(
    state: web::Data<AppState>,
    body: web::Json<StockVerificationRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let session_id = SessionId::parse(&body.session_id)?;
    if let Some(item) = body.products.iter().find(|i| i.quantity < 1) {
        return Err(AppError::BadRequest(format!(
            "Invalid quantity {} for product {}",
            item.quantity, item.external_id
        )));
    }

    let request = RelayRequest {
        order_id: OrderId::from(body.order_id),
        session_id,
        items: body
            .products
            .into_iter()
            .map(|i| StockCheckItem {
                external_id: i.external_id,
                quantity: i.quantity,
            })
            .collect(),
        callback_url: body
            .webhook_url
            .unwrap_or_else(|| state.callback_url.clone()),
    };

    let data = state.relay.relay(&request).await?;
    Ok(HttpResponse::Ok().json(StockVerificationResponse {
        success: true,
        message: "Stock verification sent to the warehouse".to_string(),
        data,
    }))
}

/// GET /orders/{order_id}
///
/// Side-effect free; clients poll this until the order is terminal.
#[utoipa::path(
    get,
    path = "/orders/{order_id}",
    params(("order_id" = String, Path, description = "Order identifier")),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = OrderId::from(path.into_inner());
    let orders = state.orders.clone();
    let order = web::block(move || orders.get_order(&order_id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[utoipa::path(
    get,
    path = "/orders/{order_id}/events",
    params(("order_id" = String, Path, description = "Order identifier")),
    responses(
        (status = 200, description = "Outbox events, oldest first", body = [OrderEventResponse]),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn order_events(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = OrderId::from(path.into_inner());
    let orders = state.orders.clone();
    let events = web::block(move || orders.order_events(&order_id)).await??;
    let body: Vec<OrderEventResponse> = events.into_iter().map(OrderEventResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}
