use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use learnhub::api::router;
use learnhub::catalog::CourseCatalog;
use learnhub::config::AppConfig;
use learnhub::db;
use learnhub::payment::gateway_from_config;
use learnhub::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "learnhub=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;
    let pool = db::connect(&config.database_url).await?;
    let catalog = CourseCatalog::load(&config.fixture_path)?;
    let gateway = gateway_from_config(&config)?;

    let addr = config.addr;
    let state = AppState::build(config, pool, catalog, gateway).await?;

    let mut purchases = state.events.subscribe();
    tokio::spawn(async move {
        loop {
            match purchases.recv().await {
                Ok(event) => info!("purchase event: {:?}", event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("purchase event listener skipped {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let app = router(state);

    info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
