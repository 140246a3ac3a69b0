//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::trafikverket::OperativeEvent;

/// Query string of the board page.
#[derive(Debug, Default, Deserialize)]
pub struct BoardRequest {
    /// Station name or signature as typed by the user.
    pub station: Option<String>,
}

/// Operative events in the JSON API.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    /// `false` when the capability is unavailable for this API key.
    pub available: bool,
    pub events: Vec<OperativeEvent>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
