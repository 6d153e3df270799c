use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::product::{NewProduct, Product};
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Decimal price as a string, e.g. "1999.99"
    pub price: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub is_new: Option<bool>,
    /// Identifier the warehouse knows the product by
    pub external_id: Option<String>,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price: p.price.to_string(),
            image: p.image,
            category: p.category,
            is_new: p.is_new,
            external_id: p.external_id,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub is_new: Option<bool>,
    pub external_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPriceRequest {
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeedResponse {
    /// Number of products inserted; zero when the catalog was not empty
    pub inserted: usize,
}

fn parse_price(raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid price '{}': {}", raw, e)))
}

// ── Handlers ─────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "All catalog products", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let catalog = state.catalog.clone();
    let products = web::block(move || catalog.list_products()).await??;
    let body: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let catalog = state.catalog.clone();
    let product = web::block(move || catalog.get_product(id)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid name or price"),
    ),
    tag = "products"
)]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let new_product = NewProduct {
        price: parse_price(&body.price)?,
        name: body.name,
        description: body.description,
        image: body.image,
        category: body.category,
        is_new: body.is_new,
        external_id: body.external_id,
    };

    let catalog = state.catalog.clone();
    let product = web::block(move || catalog.create_product(new_product)).await??;
    log::info!("Created product {} ({})", product.id, product.name);
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

#[utoipa::path(
    post,
    path = "/products/seed",
    responses((status = 200, description = "Sample products inserted", body = SeedResponse)),
    tag = "products"
)]
pub async fn seed_products(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let catalog = state.catalog.clone();
    let inserted = web::block(move || catalog.seed_sample_products()).await??;
    Ok(HttpResponse::Ok().json(SeedResponse { inserted }))
}

#[utoipa::path(
    put,
    path = "/products/{id}/price",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = SetPriceRequest,
    responses(
        (status = 200, description = "Price updated", body = ProductResponse),
        (status = 400, description = "Invalid price"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn set_price(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SetPriceRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let price = parse_price(&body.price)?;
    let catalog = state.catalog.clone();
    let product = web::block(move || catalog.set_price(id, price)).await??;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// Cart lines that reference the product stay behind and show up without a
/// product afterwards.
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let catalog = state.catalog.clone();
    web::block(move || catalog.delete_product(id)).await??;
    Ok(HttpResponse::NoContent().finish())
}
