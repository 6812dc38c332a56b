use order_kit::backend::InMemoryBackend;
use order_kit::config::ServerConfig;
use order_kit::{http, ShopService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .ok();

    let config = ServerConfig::from_env()?;

    let backend = InMemoryBackend::new();
    let service = ShopService::with_config(backend, config.transaction.clone());
    let app = http::router(service);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    log::info!(
        "order-kit {} listening on http://{} (tx retries {}, backoff {:?})",
        order_kit::VERSION,
        address,
        config.transaction.max_retries,
        config.transaction.base_backoff
    );

    axum::serve(listener, app).await?;
    Ok(())
}
