//! Query builder for the Trafikverket data API.
//!
//! A [`Query`] is a pure description of one `<QUERY>` block: object type,
//! schema version, optional ordering, a filter tree and the fields to include.
//! It can be encoded either as the XML request document or as the equivalent
//! JSON document; both carry the authentication key in a login element.

use chrono::Duration;
use serde_json::{Map, Value, json};

use super::features::FeatureAvailability;

/// Provider object type for stations.
pub const TRAIN_STATION: &str = "TrainStation";
/// Provider object type for departure/arrival announcements.
pub const TRAIN_ANNOUNCEMENT: &str = "TrainAnnouncement";
/// Provider object type for operative traffic events.
pub const OPERATIVE_EVENT: &str = "OperativeEvent";

const SCHEMA_VERSION: &str = "1";

/// `EventState` code for an active event.
const EVENT_STATE_ACTIVE: &str = "1";
/// `EventTrafficType` codes worth showing on a passenger board.
const EVENT_TRAFFIC_TYPES: [&str; 2] = ["0", "2"];

/// Comparison operator in a filter leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
}

impl CompareOp {
    fn tag(self) -> &'static str {
        match self {
            CompareOp::Eq => "EQ",
            CompareOp::Gt => "GT",
            CompareOp::Lt => "LT",
        }
    }
}

/// A filter tree as understood by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Compare {
        op: CompareOp,
        name: &'static str,
        value: String,
    },
}

impl Filter {
    fn eq(name: &'static str, value: impl Into<String>) -> Self {
        Filter::Compare {
            op: CompareOp::Eq,
            name,
            value: value.into(),
        }
    }

    fn gt(name: &'static str, value: impl Into<String>) -> Self {
        Filter::Compare {
            op: CompareOp::Gt,
            name,
            value: value.into(),
        }
    }

    fn lt(name: &'static str, value: impl Into<String>) -> Self {
        Filter::Compare {
            op: CompareOp::Lt,
            name,
            value: value.into(),
        }
    }

    fn write_xml(&self, out: &mut String) {
        match self {
            Filter::And(children) | Filter::Or(children) => {
                let tag = if matches!(self, Filter::And(_)) {
                    "AND"
                } else {
                    "OR"
                };
                out.push('<');
                out.push_str(tag);
                out.push('>');
                for child in children {
                    child.write_xml(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            Filter::Compare { op, name, value } => {
                out.push('<');
                out.push_str(op.tag());
                out.push_str(" name='");
                out.push_str(&escape_xml_attr(name));
                out.push_str("' value='");
                out.push_str(&escape_xml_attr(value));
                out.push_str("'/>");
            }
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Filter::And(children) => {
                json!({ "AND": children.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Or(children) => {
                json!({ "OR": children.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Compare { op, name, value } => {
                let mut leaf = Map::new();
                leaf.insert(op.tag().to_string(), json!({ "name": name, "value": value }));
                Value::Object(leaf)
            }
        }
    }
}

/// Which announcement activity a departure board shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityType {
    #[default]
    Departure,
    Arrival,
}

impl ActivityType {
    /// The provider's code for this activity.
    pub fn code(self) -> &'static str {
        match self {
            ActivityType::Departure => "Avgang",
            ActivityType::Arrival => "Ankomst",
        }
    }

    /// Parse from a configuration value (`departure`/`arrival` or the provider codes).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "departure" | "departures" | "avgang" => Some(ActivityType::Departure),
            "arrival" | "arrivals" | "ankomst" => Some(ActivityType::Arrival),
            _ => None,
        }
    }
}

/// Time window and activity used for departure board queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureWindow {
    /// How far back scheduled times are still shown.
    pub lookback: Duration,
    /// How far ahead scheduled times are shown.
    pub ahead: Duration,
    /// Departures or arrivals.
    pub activity: ActivityType,
}

impl Default for DepartureWindow {
    fn default() -> Self {
        Self {
            lookback: Duration::minutes(15),
            ahead: Duration::hours(14),
            activity: ActivityType::Departure,
        }
    }
}

/// Request body encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    #[default]
    Json,
    Xml,
}

impl WireFormat {
    /// Parse from a configuration value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Some(WireFormat::Json),
            "xml" => Some(WireFormat::Xml),
            _ => None,
        }
    }

    /// `Content-Type` header for a request body in this format.
    pub fn content_type(self) -> &'static str {
        match self {
            WireFormat::Json => "application/json",
            WireFormat::Xml => "text/xml",
        }
    }

    /// Encode a query together with the authentication key.
    pub fn encode(self, query: &Query, api_key: &str) -> String {
        match self {
            WireFormat::Json => query.to_json(api_key).to_string(),
            WireFormat::Xml => query.to_xml(api_key),
        }
    }
}

/// One provider query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub object_type: &'static str,
    pub schema_version: &'static str,
    pub order_by: Option<&'static str>,
    pub filter: Option<Filter>,
    pub include: Vec<&'static str>,
}

impl Query {
    /// All stations, with the fields needed for the station directory.
    pub fn stations() -> Self {
        Self {
            object_type: TRAIN_STATION,
            schema_version: SCHEMA_VERSION,
            order_by: None,
            filter: None,
            include: vec![
                "Prognosticated",
                "AdvertisedLocationName",
                "LocationSignature",
            ],
        }
    }

    /// Announcements at `signature` inside the configured window.
    ///
    /// A row qualifies when its scheduled time falls inside
    /// `[now - lookback, now + ahead]` or its estimated time is still in the
    /// future. The signature is embedded as given; checking it against known
    /// stations is up to the caller.
    pub fn departures(signature: &str, window: &DepartureWindow) -> Self {
        let filter = Filter::And(vec![
            Filter::Or(vec![
                Filter::And(vec![
                    Filter::gt("AdvertisedTimeAtLocation", dateadd(-window.lookback)),
                    Filter::lt("AdvertisedTimeAtLocation", dateadd(window.ahead)),
                ]),
                Filter::gt("EstimatedTimeAtLocation", "$now"),
            ]),
            Filter::eq("LocationSignature", signature),
            Filter::eq("ActivityType", window.activity.code()),
        ]);

        Self {
            object_type: TRAIN_ANNOUNCEMENT,
            schema_version: SCHEMA_VERSION,
            order_by: Some("AdvertisedTimeAtLocation"),
            filter: Some(filter),
            include: vec![
                "InformationOwner",
                "AdvertisedTimeAtLocation",
                "TrackAtLocation",
                "FromLocation",
                "ToLocation",
                "EstimatedTimeAtLocation",
                "AdvertisedTrainIdent",
                "Canceled",
                "Deviation",
            ],
        }
    }

    /// Active operative events for the relevant traffic types.
    ///
    /// Returns `None` when the capability is known to be unavailable, in which
    /// case no request should be made at all.
    pub fn operative_events(features: &FeatureAvailability) -> Option<Self> {
        if !features.operative_events_available() {
            return None;
        }

        let traffic_types = EVENT_TRAFFIC_TYPES
            .iter()
            .map(|code| Filter::eq("EventTrafficType", *code))
            .collect();

        Some(Self {
            object_type: OPERATIVE_EVENT,
            schema_version: SCHEMA_VERSION,
            order_by: None,
            filter: Some(Filter::And(vec![
                Filter::eq("EventState", EVENT_STATE_ACTIVE),
                Filter::Or(traffic_types),
            ])),
            include: Vec::new(),
        })
    }

    /// The full XML request document.
    pub fn to_xml(&self, api_key: &str) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<REQUEST>");
        out.push_str("<LOGIN authenticationkey='");
        out.push_str(&escape_xml_attr(api_key));
        out.push_str("'/>");

        out.push_str("<QUERY objecttype='");
        out.push_str(self.object_type);
        out.push_str("' schemaversion='");
        out.push_str(self.schema_version);
        out.push('\'');
        if let Some(order_by) = self.order_by {
            out.push_str(" orderby='");
            out.push_str(order_by);
            out.push('\'');
        }
        out.push('>');

        match &self.filter {
            Some(filter) => {
                out.push_str("<FILTER>");
                filter.write_xml(&mut out);
                out.push_str("</FILTER>");
            }
            None => out.push_str("<FILTER/>"),
        }

        for field in &self.include {
            out.push_str("<INCLUDE>");
            out.push_str(field);
            out.push_str("</INCLUDE>");
        }

        out.push_str("</QUERY></REQUEST>");
        out
    }

    /// The full JSON request document.
    pub fn to_json(&self, api_key: &str) -> Value {
        let mut query = Map::new();
        query.insert("objecttype".into(), json!(self.object_type));
        query.insert("schemaversion".into(), json!(self.schema_version));
        if let Some(order_by) = self.order_by {
            query.insert("orderby".into(), json!(order_by));
        }
        query.insert(
            "filter".into(),
            self.filter.as_ref().map_or_else(|| json!({}), Filter::to_json),
        );
        if !self.include.is_empty() {
            query.insert("include".into(), json!(self.include));
        }

        json!({
            "request": {
                "login": { "authenticationkey": api_key },
                "query": [Value::Object(query)],
            }
        })
    }
}

/// Render a `$dateadd(...)` expression for an offset relative to now.
fn dateadd(offset: Duration) -> String {
    let sign = if offset < Duration::zero() { "-" } else { "" };
    let secs = offset.num_seconds().unsigned_abs();
    format!(
        "$dateadd({sign}{:02}:{:02}:{:02})",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

fn escape_xml_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
