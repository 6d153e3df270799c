use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::products::ProductResponse;
use super::session_from_path;
use crate::domain::cart::{CartLine, CartLineView};
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub added_at: String,
    /// Absent when the product was deleted from the catalog
    pub product: Option<ProductResponse>,
    pub subtotal: Option<String>,
}

impl From<CartLineView> for CartLineResponse {
    fn from(view: CartLineView) -> Self {
        let subtotal = view
            .product
            .as_ref()
            .map(|p| (&p.price * BigDecimal::from(view.line.quantity)).to_string());
        Self {
            id: view.line.id,
            product_id: view.line.product_id,
            quantity: view.line.quantity,
            added_at: view.line.added_at.to_rfc3339(),
            product: view.product.map(ProductResponse::from),
            subtotal,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub session_id: String,
    pub lines: Vec<CartLineResponse>,
    /// Sum over lines whose product still exists, at current catalog prices
    pub total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineSummary {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

impl From<CartLine> for CartLineSummary {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id,
            product_id: line.product_id,
            quantity: line.quantity,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    /// Zero or less removes the line
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearCartResponse {
    pub removed: usize,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/sessions/{session_id}/cart",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Cart contents", body = CartResponse),
        (status = 400, description = "Invalid session id"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = session_from_path(&path)?;
    let cart = state.cart.clone();
    let session_for_block = session.clone();
    let views = web::block(move || cart.get_cart(&session_for_block)).await??;

    let total = views
        .iter()
        .filter_map(|v| {
            v.product
                .as_ref()
                .map(|p| &p.price * BigDecimal::from(v.line.quantity))
        })
        .fold(BigDecimal::zero(), |acc, subtotal| acc + subtotal);

    Ok(HttpResponse::Ok().json(CartResponse {
        session_id: session.to_string(),
        lines: views.into_iter().map(CartLineResponse::from).collect(),
        total: total.to_string(),
    }))
}

/// Adding a product already in the cart increases that line's quantity.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/cart",
    params(("session_id" = String, Path, description = "Session identifier")),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Line added or merged", body = CartLineSummary),
        (status = 400, description = "Invalid quantity or session id"),
        (status = 404, description = "Product not found"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, AppError> {
    let session = session_from_path(&path)?;
    let AddToCartRequest {
        product_id,
        quantity,
    } = body.into_inner();
    let cart = state.cart.clone();
    let line = web::block(move || cart.add_to_cart(&session, product_id, quantity)).await??;
    Ok(HttpResponse::Ok().json(CartLineSummary::from(line)))
}

#[utoipa::path(
    patch,
    path = "/sessions/{session_id}/cart/{line_id}",
    params(
        ("session_id" = String, Path, description = "Session identifier"),
        ("line_id" = Uuid, Path, description = "Cart line UUID"),
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity set", body = CartLineSummary),
        (status = 204, description = "Line removed"),
        (status = 404, description = "Cart line not found"),
    ),
    tag = "cart"
)]
pub async fn update_line_quantity(
    state: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let (raw_session, line_id) = path.into_inner();
    let session = session_from_path(&raw_session)?;
    let quantity = body.quantity;
    let cart = state.cart.clone();
    let updated =
        web::block(move || cart.update_line_quantity(&session, line_id, quantity)).await??;

    Ok(match updated {
        Some(line) => HttpResponse::Ok().json(CartLineSummary::from(line)),
        None => HttpResponse::NoContent().finish(),
    })
}

#[utoipa::path(
    delete,
    path = "/sessions/{session_id}/cart/{line_id}",
    params(
        ("session_id" = String, Path, description = "Session identifier"),
        ("line_id" = Uuid, Path, description = "Cart line UUID"),
    ),
    responses(
        (status = 204, description = "Line removed"),
        (status = 404, description = "Cart line not found"),
    ),
    tag = "cart"
)]
pub async fn remove_line(
    state: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (raw_session, line_id) = path.into_inner();
    let session = session_from_path(&raw_session)?;
    let cart = state.cart.clone();
    web::block(move || cart.remove_line(&session, line_id)).await??;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/sessions/{session_id}/cart",
    params(("session_id" = String, Path, description = "Session identifier")),
    responses((status = 200, description = "Cart emptied", body = ClearCartResponse)),
    tag = "cart"
)]
pub async fn clear_cart(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = session_from_path(&path)?;
    let cart = state.cart.clone();
    let removed = web::block(move || cart.clear_cart(&session)).await??;
    Ok(HttpResponse::Ok().json(ClearCartResponse { removed }))
}
