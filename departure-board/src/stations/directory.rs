//! In-memory station lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::trafikverket::{Backend, Station, TrafikverketClient, TrafikverketError};

#[derive(Debug, Default)]
struct Inner {
    /// Stations in provider order.
    stations: Vec<Station>,
    /// Signature → index into `stations`.
    by_sign: HashMap<String, usize>,
}

impl Inner {
    fn build(stations: Vec<Station>) -> Self {
        let by_sign = stations
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.sign.is_empty())
            .map(|(i, s)| (s.sign.clone(), i))
            .collect();
        Self { stations, by_sign }
    }

    fn get(&self, sign: &str) -> Option<&Station> {
        self.by_sign.get(sign).and_then(|&i| self.stations.get(i))
    }
}

/// Thread-safe station lookup keyed by signature.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    inner: Arc<RwLock<Inner>>,
}

impl StationDirectory {
    /// Create a directory by fetching every station from the API.
    pub async fn load<B: Backend>(client: &TrafikverketClient<B>) -> Result<Self, TrafikverketError> {
        let stations = client.fetch_stations().await?;
        Ok(Self::from_stations(stations))
    }

    /// Create an empty directory (stations failed to load, or tests).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_stations(stations: Vec<Station>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::build(stations))),
        }
    }

    /// Replace the contents, returning the new station count.
    pub async fn replace(&self, stations: Vec<Station>) -> usize {
        let inner = Inner::build(stations);
        let count = inner.stations.len();
        *self.inner.write().await = inner;
        count
    }

    /// Look up a station by signature.
    pub async fn get(&self, sign: &str) -> Option<Station> {
        self.inner.read().await.get(sign).cloned()
    }

    /// Station name for `sign`, or the sign itself when unknown.
    pub async fn display_name(&self, sign: &str) -> String {
        self.inner
            .read()
            .await
            .get(sign)
            .map_or_else(|| sign.to_string(), |s| s.name.clone())
    }

    /// Resolve many signatures at once under a single lock.
    pub async fn display_names<'a>(&self, signs: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let guard = self.inner.read().await;
        signs
            .into_iter()
            .map(|sign| guard.get(sign).map_or_else(|| sign.to_string(), |s| s.name.clone()))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.stations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.stations.is_empty()
    }

    /// Stations offered in the picker: prognosticated ones, sorted by name.
    pub async fn selectable(&self) -> Vec<Station> {
        let guard = self.inner.read().await;
        let mut list: Vec<Station> = guard
            .stations
            .iter()
            .filter(|s| s.prognosticated)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Turn user input into a signature.
    ///
    /// Tries, in order: an exact name among selectable stations, a known
    /// signature (exact, then ignoring case), then a case-insensitive name
    /// match among selectable stations.
    pub async fn resolve(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let guard = self.inner.read().await;
        let selectable = || guard.stations.iter().filter(|s| s.prognosticated);

        if let Some(station) = selectable().find(|s| s.name == input) {
            return Some(station.sign.clone());
        }

        if guard.by_sign.contains_key(input) {
            return Some(input.to_string());
        }
        if let Some(sign) = guard.by_sign.keys().find(|k| k.eq_ignore_ascii_case(input)) {
            return Some(sign.clone());
        }

        let lower = input.to_lowercase();
        selectable()
            .find(|s| s.name.to_lowercase() == lower)
            .map(|s| s.sign.clone())
    }
}
