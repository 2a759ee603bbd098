//! Market news stream: binary entrypoint.
//! Loads configuration, starts the pipeline and serves the Axum router.

use market_news_stream::app::Services;
use market_news_stream::config::AppConfig;
use market_news_stream::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` controls the filter (default `info`); `LOG_FORMAT=json` switches
/// to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialized: {e}");
    }
}

#[shuttle_runtime::main]
async fn main() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default()?;
    let metrics = Metrics::init()?;

    // Fails fast on an unusable analysis backend or feed credentials.
    let services = Services::from_config(&cfg)?;
    services.start_enabled(&cfg);

    let router = services.router().merge(metrics.router());
    Ok(router.into())
}
