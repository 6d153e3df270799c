pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod poller;
pub mod schema;
pub mod signature;
pub mod state;
pub mod sweeper;

use std::net::TcpListener;

use actix_web::http::Method;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};
pub use state::{AppState, Repositories};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migrations", applied.len());
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::seed_products,
        handlers::products::set_price,
        handlers::products::delete_product,
        handlers::sessions::create_session,
        handlers::cart::get_cart,
        handlers::cart::add_to_cart,
        handlers::cart::update_line_quantity,
        handlers::cart::remove_line,
        handlers::cart::clear_cart,
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::checkout,
        handlers::orders::verify_stock,
        handlers::orders::get_order,
        handlers::orders::order_events,
        handlers::webhook::warehouse_callback,
    ),
    tags(
        (name = "products", description = "Product catalog"),
        (name = "sessions", description = "Anonymous shopper sessions"),
        (name = "cart", description = "Per-session cart"),
        (name = "orders", description = "Pending orders and stock verification"),
        (name = "webhooks", description = "Warehouse callbacks"),
    )
)]
pub struct ApiDoc;

/// Register every route on `cfg`. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{cart, orders, products, sessions, webhook};

    cfg.service(
        web::scope("/products")
            .route("", web::get().to(products::list_products))
            .route("", web::post().to(products::create_product))
            // Before "/{id}" so "seed" is never read as a product id.
            .route("/seed", web::post().to(products::seed_products))
            .route("/{id}", web::get().to(products::get_product))
            .route("/{id}", web::delete().to(products::delete_product))
            .route("/{id}/price", web::put().to(products::set_price)),
    )
    .service(
        web::scope("/sessions")
            .route("", web::post().to(sessions::create_session))
            .route("/{session_id}/cart", web::get().to(cart::get_cart))
            .route("/{session_id}/cart", web::post().to(cart::add_to_cart))
            .route("/{session_id}/cart", web::delete().to(cart::clear_cart))
            .route(
                "/{session_id}/cart/{line_id}",
                web::patch().to(cart::update_line_quantity),
            )
            .route(
                "/{session_id}/cart/{line_id}",
                web::delete().to(cart::remove_line),
            )
            .route("/{session_id}/orders", web::post().to(orders::create_order))
            .route("/{session_id}/orders", web::get().to(orders::list_orders))
            .route("/{session_id}/checkout", web::post().to(orders::checkout)),
    )
    .route("/stock-verification", web::post().to(orders::verify_stock))
    .service(
        web::scope("/orders")
            .route("/{order_id}", web::get().to(orders::get_order))
            .route("/{order_id}/events", web::get().to(orders::order_events)),
    )
    .service(
        web::scope("/webhooks")
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Methods", "POST, OPTIONS"))
                    .add((
                        "Access-Control-Allow-Headers",
                        "Content-Type, Authorization, X-Warehouse-Signature",
                    )),
            )
            .route("/warehouse", web::post().to(webhook::warehouse_callback))
            .route(
                "/warehouse",
                web::method(Method::OPTIONS).to(webhook::warehouse_preflight),
            ),
    );
}

/// Build an actix-web `Server` on an already bound listener.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    listener: TcpListener,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .listen(listener)?
    .run())
}
