use std::sync::Arc;

use crate::application::cart_service::CartService;
use crate::application::catalog_service::CatalogService;
use crate::application::order_service::OrderService;
use crate::application::stock_relay::StockRelay;
use crate::db::DbPool;
use crate::domain::ports::{CartRepository, OrderRepository, ProductRepository};
use crate::infrastructure::cart_repo::DieselCartRepository;
use crate::infrastructure::in_memory::{
    InMemoryCartRepository, InMemoryOrderRepository, InMemoryProductRepository,
};
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::product_repo::DieselProductRepository;
use crate::infrastructure::warehouse_client::WarehouseClient;
use crate::signature::WebhookVerifier;

/// The three stores every service is built from.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    pub fn diesel(pool: DbPool) -> Self {
        Self {
            products: Arc::new(DieselProductRepository::new(pool.clone())),
            carts: Arc::new(DieselCartRepository::new(pool.clone())),
            orders: Arc::new(DieselOrderRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            products: Arc::new(InMemoryProductRepository::new()),
            carts: Arc::new(InMemoryCartRepository::new()),
            orders: Arc::new(InMemoryOrderRepository::new()),
        }
    }
}

/// Shared application state handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogService,
    pub cart: CartService,
    pub orders: OrderService,
    pub relay: StockRelay,
    pub verifier: WebhookVerifier,
    /// Where the warehouse is expected to call back. Logged with each relay;
    /// the stock check body itself carries only product and quantity.
    pub callback_url: String,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        warehouse: WarehouseClient,
        verifier: WebhookVerifier,
        callback_url: String,
    ) -> Self {
        Self {
            catalog: CatalogService::new(repos.products.clone()),
            cart: CartService::new(repos.products.clone(), repos.carts.clone()),
            orders: OrderService::new(repos.products, repos.carts, repos.orders),
            relay: StockRelay::new(warehouse),
            verifier,
            callback_url,
        }
    }
}
