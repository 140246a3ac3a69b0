//! Application state for the web layer.

use std::sync::Arc;

use crate::stations::StationDirectory;
use crate::trafikverket::{HttpBackend, TrafikverketClient};

/// Shared application state.
pub struct AppState<B = HttpBackend> {
    /// Trafikverket API client
    pub client: Arc<TrafikverketClient<B>>,

    /// Stations loaded at startup
    pub stations: StationDirectory,

    /// Why the station list is empty, if loading it failed
    pub stations_error: Option<Arc<str>>,
}

impl<B> AppState<B> {
    /// Create a new app state.
    pub fn new(
        client: TrafikverketClient<B>,
        stations: StationDirectory,
        stations_error: Option<String>,
    ) -> Self {
        Self {
            client: Arc::new(client),
            stations,
            stations_error: stations_error.map(Arc::from),
        }
    }
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            stations: self.stations.clone(),
            stations_error: self.stations_error.clone(),
        }
    }
}
