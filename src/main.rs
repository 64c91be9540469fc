//! Dashboard Feed Aggregator — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the source config, routes, and metrics.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use devdash_aggregator::api::{self, AppState};
use devdash_aggregator::config::AppConfig;
use devdash_aggregator::metrics::Metrics;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("devdash_aggregator=info"));

    // try_init: the deploy runtime may already own a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This enables
    // AGGREGATOR_CONFIG_PATH from .env so config.rs can pick it up.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = AppConfig::load_default().expect("Failed to load source config");
    tracing::info!(
        sources = config.sources.len(),
        fetch_timeout_secs = config.fetch_timeout_secs,
        "loaded source configuration"
    );

    let metrics = Metrics::init(config.fetch_timeout_secs);
    let router = api::router(AppState::new(config)).merge(metrics.router());

    Ok(router.into())
}
