use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::RwLock;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use agrimandi::api::AppState;
use agrimandi::cache::PersistentCache;
use agrimandi::calendar::{CropCalendar, ReferenceData};
use agrimandi::config::AgriMandiConfig;
use agrimandi::geocoding::GeocodingClient;
use agrimandi::listings::ListingBook;
use agrimandi::market::PriceBoard;
use agrimandi::session::{FileSessionStore, SessionContext};
use agrimandi::weather::WeatherService;
use agrimandi::web;

fn init_tracing(config: &AgriMandiConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn expand_home(path: &str) -> std::path::PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    std::path::PathBuf::from(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AgriMandiConfig::load().context("Failed to load configuration")?;
    init_tracing(&config);

    let cache_path = expand_home(&config.cache.location);
    let cache = match PersistentCache::open(&cache_path) {
        Ok(cache) => Some(Arc::new(cache)),
        Err(err) => {
            warn!(error = %err, "Cache unavailable, continuing without it");
            None
        }
    };

    let data = ReferenceData::embedded().context("Failed to load reference data")?;
    let calendar = CropCalendar::new(data);

    let weather = WeatherService::new(&config.weather, cache, config.cache.ttl_hours)
        .context("Failed to build weather service")?;

    let http_client = reqwest_middleware::ClientBuilder::new(
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(u64::from(
                config.weather.timeout_seconds,
            )))
            .build()
            .context("Failed to build HTTP client")?,
    )
    .build();
    let geocoding = GeocodingClient::new(http_client, &config.geocoding);

    let session_path = AgriMandiConfig::ensure_config_dir()
        .map(|dir| dir.join("session.json"))
        .unwrap_or_else(|_| std::path::PathBuf::from("session.json"));
    let sessions = SessionContext::initialize(Box::new(FileSessionStore::new(session_path)))
        .context("Failed to initialize session store")?;

    let market = PriceBoard::from_reference().context("Failed to load market quotes")?;

    let state = Arc::new(AppState {
        calendar,
        market: RwLock::new(market),
        listings: RwLock::new(ListingBook::new()),
        sessions: RwLock::new(sessions),
        weather,
        geocoding,
    });

    web::run(config.server.port, state).await
}
