//! Runtime configuration.

use std::time::Duration;

use tracing::warn;

use crate::trafikverket::{ActivityType, DepartureWindow, WireFormat};

/// Default endpoint for the Trafikverket data API.
pub const DEFAULT_BASE_URL: &str = "https://api.trafikinfo.trafikverket.se/v2/data.json";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(12_000);

/// Configuration for the Trafikverket client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Authentication key; may be empty, in which case every request fails
    /// with a configuration error.
    pub api_key: String,

    /// Endpoint to POST queries to.
    pub base_url: String,

    /// Deadline for a single request.
    pub timeout: Duration,

    /// Request body encoding.
    pub wire_format: WireFormat,

    /// Departure board window and activity.
    pub window: DepartureWindow,

    /// Skip operative events entirely.
    pub disable_operative_events: bool,
}

impl ApiConfig {
    /// Create a new config with the given API key and defaults elsewhere.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            wire_format: WireFormat::default(),
            window: DepartureWindow::default(),
            disable_operative_events: false,
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`.
    ///
    /// A missing `API_KEY` only produces a warning; unparseable values fall
    /// back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = lookup("API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            warn!("API_KEY not set. Requests to Trafikverket will fail.");
        }

        let mut config = Self::new(api_key.trim());

        if let Some(url) = lookup("TRAFIKVERKET_URL").filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup("REQUEST_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.timeout = Duration::from_millis(ms),
                _ => warn!(value = %raw, "ignoring invalid REQUEST_TIMEOUT_MS"),
            }
        }

        if let Some(raw) = lookup("WIRE_FORMAT") {
            match WireFormat::parse(&raw) {
                Some(format) => config.wire_format = format,
                None => warn!(value = %raw, "ignoring invalid WIRE_FORMAT"),
            }
        }

        if let Some(raw) = lookup("DEPARTURE_WINDOW_HOURS") {
            match raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .and_then(chrono::Duration::try_hours)
            {
                Some(ahead) => config.window.ahead = ahead,
                None => warn!(value = %raw, "ignoring invalid DEPARTURE_WINDOW_HOURS"),
            }
        }

        if let Some(raw) = lookup("ACTIVITY_TYPE") {
            match ActivityType::parse(&raw) {
                Some(activity) => config.window.activity = activity,
                None => warn!(value = %raw, "ignoring invalid ACTIVITY_TYPE"),
            }
        }

        config.disable_operative_events = lookup("DISABLE_OPERATIVE_EVENTS")
            .as_deref()
            .is_some_and(parse_flag);

        config
    }

    /// Set a custom endpoint (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the request body encoding.
    pub fn with_wire_format(mut self, format: WireFormat) -> Self {
        self.wire_format = format;
        self
    }

    /// Set the departure board window.
    pub fn with_window(mut self, window: DepartureWindow) -> Self {
        self.window = window;
        self
    }

    /// Disable operative events up front.
    pub fn with_operative_events_disabled(mut self, disabled: bool) -> Self {
        self.disable_operative_events = disabled;
        self
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_defaults() {
        let config = ApiConfig::new("test-key");

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_millis(12_000));
        assert_eq!(config.wire_format, WireFormat::Json);
        assert_eq!(config.window, DepartureWindow::default());
        assert!(!config.disable_operative_events);
    }

    #[test]
    fn config_builder() {
        let config = ApiConfig::new("test-key")
            .with_base_url("http://localhost:8080")
            .with_timeout(Duration::from_secs(2))
            .with_wire_format(WireFormat::Xml)
            .with_operative_events_disabled(true);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert_eq!(config.wire_format, WireFormat::Xml);
        assert!(config.disable_operative_events);
    }

    #[test]
    fn from_lookup_reads_everything() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("API_KEY", " abc "),
            ("DISABLE_OPERATIVE_EVENTS", "TRUE"),
            ("REQUEST_TIMEOUT_MS", "5000"),
            ("WIRE_FORMAT", "xml"),
            ("DEPARTURE_WINDOW_HOURS", "2"),
            ("ACTIVITY_TYPE", "arrival"),
            ("TRAFIKVERKET_URL", "http://127.0.0.1:9999/data.json"),
        ]));

        assert_eq!(config.api_key, "abc");
        assert!(config.disable_operative_events);
        assert_eq!(config.timeout, Duration::from_millis(5000));
        assert_eq!(config.wire_format, WireFormat::Xml);
        assert_eq!(config.window.ahead, chrono::Duration::hours(2));
        assert_eq!(config.window.activity, ActivityType::Arrival);
        assert_eq!(config.base_url, "http://127.0.0.1:9999/data.json");
    }

    #[test]
    fn from_lookup_tolerates_missing_and_bad_values() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("REQUEST_TIMEOUT_MS", "soon"),
            ("WIRE_FORMAT", "yaml"),
            ("DISABLE_OPERATIVE_EVENTS", "nope"),
        ]));

        assert_eq!(config.api_key, "");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.wire_format, WireFormat::Json);
        assert!(!config.disable_operative_events);
    }

    #[test]
    fn from_lookup_ignores_out_of_range_window() {
        for raw in ["9999999999999", "0", "-3", "two"] {
            let config = ApiConfig::from_lookup(lookup(&[
                ("API_KEY", "abc"),
                ("DEPARTURE_WINDOW_HOURS", raw),
            ]));
            assert_eq!(config.window.ahead, DepartureWindow::default().ahead, "{raw}");
        }
    }
}
