use std::net::SocketAddr;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use departure_board::config::ApiConfig;
use departure_board::stations::StationDirectory;
use departure_board::trafikverket::TrafikverketClient;
use departure_board::web::{AppState, create_router};

/// How often to refresh the station list (24 hours).
const STATION_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_STATIC_DIR: &str = "static";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();
    let client = match TrafikverketClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to create Trafikverket client");
            std::process::exit(1);
        }
    };

    // A failed station load still serves the page, with an empty picker.
    info!("fetching stations");
    let (stations, stations_error) = match StationDirectory::load(&client).await {
        Ok(stations) => {
            info!(count = stations.len().await, "loaded stations");
            (stations, None)
        }
        Err(e) => {
            warn!(error = %e, "could not load stations");
            (StationDirectory::empty(), Some(e.to_string()))
        }
    };

    let state = AppState::new(client, stations, stations_error);

    let refresh = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATION_REFRESH_INTERVAL);
        interval.tick().await; // First tick is immediate, skip it
        loop {
            interval.tick().await;
            match refresh.client.fetch_stations().await {
                Ok(list) => {
                    let count = refresh.stations.replace(list).await;
                    info!(count, "refreshed stations");
                }
                Err(e) => warn!(error = %e, "failed to refresh stations"),
            }
        }
    });

    let static_dir =
        std::env::var("STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_string());
    let app = create_router(state, &static_dir);

    let addr: SocketAddr = match std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
    {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, "invalid BIND_ADDR");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!("Departure board listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET  /health                 - Health check");
    info!("  GET  /departures?station=    - Departure board page");
    info!("  GET  /api/stations           - All stations");
    info!("  GET  /api/departures/:sign   - Announcements at a station");
    info!("  GET  /api/events             - Active operative events");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
    }
}
