use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::order::{OrderId, OrderStatus, Resolution};
use crate::errors::AppError;
use crate::signature::SIGNATURE_HEADER;
use crate::AppState;

/// Per-product detail the warehouse may attach to its answer.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductStock {
    pub product_id: String,
    pub quantity: i32,
    pub available_stock: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseCallback {
    pub order_id: String,
    pub session_id: String,
    pub has_stock: bool,
    #[serde(default)]
    pub products: Option<Vec<ProductStock>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallbackReceipt {
    pub order_id: String,
    pub session_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub received_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub data: CallbackReceipt,
}

/// POST /webhooks/warehouse
///
/// The body is read raw so the signature can be checked before anything is
/// parsed.
#[utoipa::path(
    post,
    path = "/webhooks/warehouse",
    request_body = WarehouseCallback,
    params(
        ("X-Warehouse-Signature" = String, Header, description = "sha256=<hex HMAC-SHA256 of the raw body>"),
    ),
    responses(
        (status = 200, description = "Callback applied", body = WebhookResponse),
        (status = 401, description = "Missing or invalid signature"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already resolved the other way"),
        (status = 500, description = "Malformed body or storage failure"),
    ),
    tag = "webhooks"
)]
pub async fn warehouse_callback(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = state.verifier.verify(&body, signature) {
        log::warn!("Rejected warehouse callback: {}", e);
        return Err(e.into());
    }

    let callback: WarehouseCallback = serde_json::from_slice(&body).map_err(|e| {
        log::error!("Unreadable warehouse callback: {}", e);
        AppError::Internal(format!("invalid callback body: {}", e))
    })?;

    log::info!(
        "Warehouse callback for order {} (session {}): has_stock={}, {} product details",
        callback.order_id,
        callback.session_id,
        callback.has_stock,
        callback.products.as_ref().map_or(0, Vec::len)
    );

    let WarehouseCallback {
        order_id,
        session_id,
        has_stock,
        message,
        ..
    } = callback;

    let orders = state.orders.clone();
    let claimed_session = session_id.clone();
    let resolution = web::block(move || {
        orders.apply_stock_answer(
            &OrderId::from(order_id),
            &claimed_session,
            has_stock,
            message,
        )
    })
    .await??;

    let message = match &resolution {
        Resolution::Unchanged(_) => "Callback already processed",
        Resolution::Applied(order) if order.status == OrderStatus::Confirmed => {
            "Stock confirmed; order accepted"
        }
        Resolution::Applied(_) => "Stock unavailable; order rejected",
    };
    let order = resolution.into_order();

    Ok(HttpResponse::Ok().json(WebhookResponse {
        success: true,
        message: message.to_string(),
        data: CallbackReceipt {
            order_id: order.order_id.to_string(),
            session_id,
            status: order.status.to_string(),
            reason: order.reason,
            received_at: Utc::now().to_rfc3339(),
        },
    }))
}

/// Pre-flight answer; the CORS headers come from the scope's default headers.
pub async fn warehouse_preflight() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({}))
}
