use std::net::TcpListener;

use dotenvy::dotenv;
use storefront_orders::infrastructure::warehouse_client::WarehouseClient;
use storefront_orders::signature::WebhookVerifier;
use storefront_orders::sweeper::PendingOrderSweeper;
use storefront_orders::{
    build_server, create_pool, run_migrations, AppConfig, AppState, Repositories,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().expect("Invalid configuration");

    let pool = create_pool(&config.database_url).expect("Failed to create DB pool");
    run_migrations(&pool).expect("Failed to run database migrations");

    let warehouse = WarehouseClient::new(config.warehouse_url.clone(), config.warehouse_timeout)
        .expect("Failed to build warehouse HTTP client");
    if config.warehouse_url.is_none() {
        log::warn!("WAREHOUSE_URL is not set; stock verification requests will fail");
    }

    let state = AppState::new(
        Repositories::diesel(pool),
        warehouse,
        WebhookVerifier::new(config.webhook_secret.clone()),
        config.callback_url(),
    );

    if config.seed_catalog {
        let catalog = state.catalog.clone();
        let inserted = actix_web::web::block(move || catalog.seed_sample_products())
            .await
            .expect("Seeding task panicked")
            .expect("Failed to seed catalog");
        log::info!("Catalog seeding inserted {} products", inserted);
    }

    PendingOrderSweeper::new(
        state.orders.clone(),
        config.pending_order_timeout,
        config.sweep_interval,
    )
    .spawn();

    let listener = TcpListener::bind((config.host.as_str(), config.port))?;
    log::info!(
        "Starting server at http://{}:{} (callbacks at {})",
        config.host,
        config.port,
        config.callback_url()
    );

    build_server(state, listener)?.await
}
