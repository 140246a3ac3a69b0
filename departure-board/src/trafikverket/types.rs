//! Trafikverket API record types.
//!
//! Records are deserialized leniently: every provider field is optional, a
//! field of an unexpected JSON type reads as absent rather than failing the
//! record, and fields the provider sends either as a single value or as an
//! array are accepted in both shapes. Fields not modelled here are kept in
//! `extra`, so the JSON API hands records on with everything the provider
//! sent, under the provider's PascalCase names.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A station as used by the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Advertised display name.
    pub name: String,
    /// Provider signature, unique per station.
    pub sign: String,
    /// Whether live predictions exist for this station.
    pub prognosticated: bool,
}

/// A `TrainAnnouncement` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Departure {
    /// Scheduled time at the location.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub advertised_time_at_location: Option<String>,

    /// Estimated time at the location, if it differs from the schedule.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub estimated_time_at_location: Option<String>,

    /// Destination(s).
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub to_location: Vec<LocationRef>,

    /// Origin(s).
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub from_location: Vec<LocationRef>,

    /// Track/platform.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub track_at_location: Option<String>,

    /// Operator responsible for the information.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub information_owner: Option<String>,

    /// Public train number.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub advertised_train_ident: Option<String>,

    /// Whether the train is cancelled at this location.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub canceled: Option<bool>,

    /// Deviation notes ("Spårändrat", "Prel. tid", ...).
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub deviation: Vec<Deviation>,

    /// Every other field the provider sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Departure {
    /// Whether the announcement is marked cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.canceled.unwrap_or(false)
    }
}

/// A location reference inside an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationRef {
    /// A bare signature string.
    Code(String),
    /// An object form with name and/or signature.
    Detailed(LocationDetail),
}

/// Object form of a location reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocationDetail {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub location_signature: Option<String>,
    /// `Priority`, `Order` and anything else.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LocationRef {
    /// The code to look up in the station directory.
    ///
    /// Prefers the signature; the provider's `LocationName` in announcements
    /// is also a signature in practice.
    pub fn key(&self) -> Option<&str> {
        match self {
            LocationRef::Code(code) => Some(code.as_str()).filter(|c| !c.is_empty()),
            LocationRef::Detailed(detail) => detail
                .location_signature
                .as_deref()
                .or(detail.location_name.as_deref())
                .filter(|c| !c.is_empty()),
        }
    }
}

/// A deviation note on an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Deviation {
    Text(String),
    Detailed {
        #[serde(rename = "Code", default, deserialize_with = "lenient_text")]
        code: Option<String>,
        #[serde(rename = "Description", default, deserialize_with = "lenient_text")]
        description: Option<String>,
    },
}

impl Deviation {
    /// Human-readable text, if any.
    pub fn description(&self) -> Option<&str> {
        match self {
            Deviation::Text(text) => Some(text.as_str()),
            Deviation::Detailed { description, code } => description.as_deref().or(code.as_deref()),
        }
    }
}

/// An `OperativeEvent` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperativeEvent {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,

    /// Numeric lifecycle state (`1` = active).
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub event_state: Option<String>,

    /// Numeric traffic type code.
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub event_traffic_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub modified_date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub end_date_time: Option<String>,

    /// Affected line sections.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub event_section: Vec<EventSection>,

    /// Every other field the provider sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperativeEvent {
    /// Type description, or a generic label.
    pub fn type_description(&self) -> &str {
        self.event_type
            .as_ref()
            .and_then(|t| t.description.as_deref())
            .unwrap_or("Event")
    }
}

/// Event classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventType {
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub event_type_code: Option<String>,
}

/// One affected stretch of line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventSection {
    #[serde(default, deserialize_with = "lenient")]
    pub from_location: Option<SectionLocation>,
    #[serde(default, deserialize_with = "lenient")]
    pub via_location: Option<SectionLocation>,
    #[serde(default, deserialize_with = "lenient")]
    pub to_location: Option<SectionLocation>,
}

impl EventSection {
    /// Signatures along the section, in from/via/to order, skipping gaps.
    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        [&self.from_location, &self.via_location, &self.to_location]
            .into_iter()
            .filter_map(|loc| loc.as_ref()?.signature.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// A location inside an event section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SectionLocation {
    #[serde(default, deserialize_with = "lenient_text")]
    pub signature: Option<String>,
}

/// Accept `null`, a single value or an array. Items of the wrong shape are
/// left out.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        item => vec![item],
    };
    Ok(items
        .into_iter()
        .filter_map(|item| T::deserialize(item).ok())
        .collect())
}

/// Text sent either as a string or as a number; anything else reads as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// `T`, or its default when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn departure_accepts_both_location_shapes() {
        let dep: Departure = serde_json::from_value(json!({
            "AdvertisedTimeAtLocation": "2025-03-01T10:15:00.000+01:00",
            "ToLocation": [{ "LocationName": "G", "Priority": 1, "Order": 0 }],
            "FromLocation": "Cst",
            "TrackAtLocation": "3",
            "AdvertisedTrainIdent": 421
        }))
        .unwrap();

        assert_eq!(dep.to_location.len(), 1);
        assert_eq!(dep.to_location[0].key(), Some("G"));
        assert_eq!(dep.from_location, vec![LocationRef::Code("Cst".into())]);
        assert_eq!(dep.advertised_train_ident.as_deref(), Some("421"));
        assert!(!dep.is_cancelled());
    }

    #[test]
    fn departure_serializes_provider_names() {
        let dep = Departure {
            track_at_location: Some("1a".into()),
            ..Departure::default()
        };
        let value = serde_json::to_value(&dep).unwrap();
        assert_eq!(value["TrackAtLocation"], "1a");
    }

    #[test]
    fn deviation_shapes() {
        let dep: Departure = serde_json::from_value(json!({
            "Deviation": [
                { "Code": "ANA027", "Description": "Spårändrat" },
                "Prel. tid"
            ],
            "Canceled": true
        }))
        .unwrap();
        let texts: Vec<_> = dep.deviation.iter().filter_map(Deviation::description).collect();
        assert_eq!(texts, vec!["Spårändrat", "Prel. tid"]);
        assert!(dep.is_cancelled());
    }

    #[test]
    fn event_sections_and_codes() {
        let event: OperativeEvent = serde_json::from_value(json!({
            "EventId": 1234,
            "EventState": 1,
            "EventTrafficType": "2",
            "EventType": { "Description": "Signalfel" },
            "EventSection": {
                "FromLocation": { "Signature": "Cst" },
                "ToLocation": { "Signature": "Sod" }
            }
        }))
        .unwrap();

        assert_eq!(event.event_id.as_deref(), Some("1234"));
        assert_eq!(event.event_state.as_deref(), Some("1"));
        assert_eq!(event.event_traffic_type.as_deref(), Some("2"));
        assert_eq!(event.type_description(), "Signalfel");
        let sigs: Vec<_> = event.event_section[0].signatures().collect();
        assert_eq!(sigs, vec!["Cst", "Sod"]);
    }

    #[test]
    fn odd_field_types_degrade_per_field() {
        let dep: Departure = serde_json::from_value(json!({
            "AdvertisedTimeAtLocation": "2025-03-01T10:15:00.000+01:00",
            "ToLocation": [{ "LocationName": "G", "Priority": "1", "Order": "first" }, 17],
            "TrackAtLocation": 3,
            "InformationOwner": { "Name": "SJ" },
            "Canceled": "maybe",
            "Deviation": 42
        }))
        .unwrap();

        assert_eq!(dep.to_location.len(), 1);
        assert_eq!(dep.to_location[0].key(), Some("G"));
        assert_eq!(dep.track_at_location.as_deref(), Some("3"));
        assert_eq!(dep.information_owner, None);
        assert!(!dep.is_cancelled());
        assert!(dep.deviation.is_empty());

        let event: OperativeEvent = serde_json::from_value(json!({
            "EventType": "Signalfel",
            "StartDateTime": false,
            "EventSection": [{ "FromLocation": "Cst", "ToLocation": { "Signature": 5 } }]
        }))
        .unwrap();
        assert_eq!(event.type_description(), "Event");
        assert_eq!(event.start_date_time, None);
        let sigs: Vec<_> = event.event_section[0].signatures().collect();
        assert_eq!(sigs, vec!["5"]);
    }

    #[test]
    fn unknown_fields_pass_through() {
        let input = json!({
            "AdvertisedTimeAtLocation": "2025-03-01T10:15:00.000+01:00",
            "ToLocation": [{ "LocationName": "G", "Priority": 1, "Order": 0 }],
            "ProductInformation": [{ "Code": "PNA014", "Description": "SJ Regional" }],
            "ActivityId": "1500adde-f7c4-9a15-08d9-e5e1a7f5b86b"
        });

        let dep: Departure = serde_json::from_value(input.clone()).unwrap();
        assert!(dep.extra.contains_key("ProductInformation"));

        assert_eq!(serde_json::to_value(&dep).unwrap(), input);
    }

    #[test]
    fn event_type_defaults() {
        assert_eq!(OperativeEvent::default().type_description(), "Event");
    }
}
