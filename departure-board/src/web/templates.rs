//! Askama templates for the web frontend.

use askama::Template;
use chrono::Local;

use crate::trafikverket::{Departure, Deviation, OperativeEvent, Station, parse_timestamp};

/// Most events shown on the board.
pub const MAX_EVENTS: usize = 25;

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// The timetable page: station picker, optional board, events.
#[derive(Template)]
#[template(path = "index.html")]
pub struct BoardTemplate {
    pub status: StatusView,
    pub stations: Vec<StationOption>,
    /// What the user typed, echoed back into the input.
    pub query: String,
    /// "Departures" or "Arrivals".
    pub board_label: &'static str,
    pub board: Option<BoardView>,
    pub events: EventsView,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// Status line under the search form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub message: String,
    /// CSS class: empty, `success` or `error`.
    pub class: &'static str,
}

impl StatusView {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: "",
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: "success",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            class: "error",
        }
    }
}

/// One `<option>` in the station datalist.
#[derive(Debug, Clone)]
pub struct StationOption {
    pub name: String,
    pub sign: String,
}

impl From<Station> for StationOption {
    fn from(station: Station) -> Self {
        Self {
            name: station.name,
            sign: station.sign,
        }
    }
}

/// The departures table.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub rows: Vec<DepartureView>,
}

/// One row of the departures table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureView {
    pub time: String,
    /// Shown only when it differs from `time`.
    pub expected: Option<String>,
    pub destination: String,
    pub owner: String,
    pub track: String,
    pub train: String,
    pub cancelled: bool,
    pub notes: String,
}

impl DepartureView {
    /// Build a row; `destinations` are the already-resolved station names.
    pub fn from_departure(departure: &Departure, destinations: &[String]) -> Self {
        let scheduled = departure
            .advertised_time_at_location
            .as_deref()
            .or(departure.estimated_time_at_location.as_deref())
            .map(clock_time)
            .unwrap_or_default();

        let expected = departure
            .estimated_time_at_location
            .as_deref()
            .map(clock_time)
            .filter(|t| !t.is_empty() && *t != scheduled);

        let notes = departure
            .deviation
            .iter()
            .filter_map(Deviation::description)
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            time: scheduled,
            expected,
            destination: destinations.join(", "),
            owner: departure.information_owner.clone().unwrap_or_default(),
            track: departure.track_at_location.clone().unwrap_or_default(),
            train: departure.advertised_train_ident.clone().unwrap_or_default(),
            cancelled: departure.is_cancelled(),
            notes,
        }
    }
}

/// The operative events list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventsView {
    /// Replaces the list when set.
    pub placeholder: Option<String>,
    pub items: Vec<EventView>,
}

impl EventsView {
    pub fn unavailable() -> Self {
        Self::placeholder("Operative events are not available for your API key.")
    }

    pub fn failed() -> Self {
        Self::placeholder("Could not load events.")
    }

    pub fn list(items: Vec<EventView>) -> Self {
        if items.is_empty() {
            return Self::placeholder("No active events right now.");
        }
        Self {
            placeholder: None,
            items,
        }
    }

    fn placeholder(text: &str) -> Self {
        Self {
            placeholder: Some(text.to_string()),
            items: Vec::new(),
        }
    }
}

/// One operative event card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventView {
    pub kind: String,
    pub start: String,
    /// Affected sections, already joined for display.
    pub sections: String,
}

impl EventView {
    /// Build a card; each entry of `sections` holds the resolved station
    /// names along one section.
    pub fn from_event(event: &OperativeEvent, sections: &[Vec<String>]) -> Self {
        let sections = sections
            .iter()
            .filter(|names| !names.is_empty())
            .map(|names| names.join(" – "))
            .collect::<Vec<_>>()
            .join("; ");

        Self {
            kind: event.type_description().to_string(),
            start: event
                .start_date_time
                .as_deref()
                .map(clock_time)
                .unwrap_or_default(),
            sections,
        }
    }
}

/// Local `HH:MM` for a provider timestamp, or empty if it doesn't parse.
pub fn clock_time(timestamp: &str) -> String {
    parse_timestamp(timestamp)
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}
