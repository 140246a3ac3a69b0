//! Trafikverket API client.
//!
//! Ties together query building, transport and normalization behind the
//! three operations the view layer needs. Owns the per-session feature
//! availability state.

use tracing::{debug, info};

use crate::config::ApiConfig;

use super::error::TrafikverketError;
use super::features::{FeatureAvailability, OPERATIVE_EVENT_UNSUPPORTED};
use super::normalize;
use super::query::{DepartureWindow, Query};
use super::transport::{Backend, HttpBackend, Transport};
use super::types::{Departure, OperativeEvent, Station};

/// Outcome of an operative events fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFeed {
    /// The capability works; the list may be empty.
    Active(Vec<OperativeEvent>),
    /// Operative events are not available for this credential or were disabled.
    Unavailable,
}

impl EventFeed {
    /// The events, empty when unavailable.
    pub fn events(&self) -> &[OperativeEvent] {
        match self {
            EventFeed::Active(events) => events,
            EventFeed::Unavailable => &[],
        }
    }

    pub fn into_events(self) -> Vec<OperativeEvent> {
        match self {
            EventFeed::Active(events) => events,
            EventFeed::Unavailable => Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, EventFeed::Active(_))
    }
}

/// Trafikverket data API client.
#[derive(Debug)]
pub struct TrafikverketClient<B = HttpBackend> {
    transport: Transport<B>,
    window: DepartureWindow,
    features: FeatureAvailability,
}

impl TrafikverketClient<HttpBackend> {
    /// Create a client talking HTTP to the configured endpoint.
    pub fn new(config: ApiConfig) -> Result<Self, TrafikverketError> {
        let backend = HttpBackend::new(config.base_url.clone())?;
        Ok(Self::with_backend(config, backend))
    }
}

impl<B: Backend> TrafikverketClient<B> {
    /// Create a client over an arbitrary backend.
    pub fn with_backend(config: ApiConfig, backend: B) -> Self {
        Self {
            transport: Transport::new(backend, config.api_key, config.wire_format, config.timeout),
            window: config.window,
            features: FeatureAvailability::new(config.disable_operative_events),
        }
    }

    /// Feature availability for this session.
    pub fn features(&self) -> &FeatureAvailability {
        &self.features
    }

    /// Window used for departure board queries.
    pub fn window(&self) -> &DepartureWindow {
        &self.window
    }

    /// The backend in use.
    pub fn backend(&self) -> &B {
        self.transport.backend()
    }

    /// Fetch every station.
    pub async fn fetch_stations(&self) -> Result<Vec<Station>, TrafikverketError> {
        let response = self.transport.send(&Query::stations()).await?;
        let stations = normalize::stations(&response);
        info!(count = stations.len(), "fetched stations");
        Ok(stations)
    }

    /// Fetch the board at `signature`, in scheduled order.
    pub async fn fetch_departures(
        &self,
        signature: &str,
    ) -> Result<Vec<Departure>, TrafikverketError> {
        if signature.trim().is_empty() {
            return Err(TrafikverketError::InvalidRequest(
                "station signature is empty".to_string(),
            ));
        }

        let response = self
            .transport
            .send(&Query::departures(signature, &self.window))
            .await?;
        let departures = normalize::departures(&response);
        debug!(signature, count = departures.len(), "fetched departures");
        Ok(departures)
    }

    /// Fetch active operative events, newest first.
    ///
    /// Makes no request once the capability is known to be unavailable. The
    /// provider's "object type does not exist" error switches the capability
    /// off for the rest of the session instead of being returned.
    pub async fn fetch_operative_events(&self) -> Result<EventFeed, TrafikverketError> {
        let Some(query) = Query::operative_events(&self.features) else {
            debug!("operative events unavailable, skipping request");
            return Ok(EventFeed::Unavailable);
        };

        match self.transport.send(&query).await {
            Ok(response) => {
                let events = normalize::operative_events(&response);
                debug!(count = events.len(), "fetched operative events");
                Ok(EventFeed::Active(events))
            }
            Err(e) if e.remote_body_contains(OPERATIVE_EVENT_UNSUPPORTED) => {
                self.features.disable_operative_events();
                Ok(EventFeed::Unavailable)
            }
            Err(e) => Err(e),
        }
    }
}
