//! Projection of provider responses into internal records.
//!
//! Responses look like `{"RESPONSE":{"RESULT":[{"<ObjectType>":[...]}]}}`.
//! Nothing here fails: a missing or oddly shaped envelope yields an empty
//! list. Announcements and events come out one per provider record, in
//! provider order; a record that isn't even an object becomes an empty one.

use chrono::{DateTime, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use super::query::{OPERATIVE_EVENT, TRAIN_ANNOUNCEMENT, TRAIN_STATION};
use super::types::{Departure, OperativeEvent, Station};

/// The records array for `object_type`, or an empty slice.
pub fn result_records<'a>(response: &'a Value, object_type: &str) -> &'a [Value] {
    response
        .pointer("/RESPONSE/RESULT/0")
        .and_then(|result| result.get(object_type))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Stations in provider order.
pub fn stations(response: &Value) -> Vec<Station> {
    result_records(response, TRAIN_STATION)
        .iter()
        .map(|record| Station {
            name: string_field(record, "AdvertisedLocationName"),
            sign: string_field(record, "LocationSignature"),
            prognosticated: record
                .get("Prognosticated")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
        .collect()
}

/// Announcements in provider order.
pub fn departures(response: &Value) -> Vec<Departure> {
    records(response, TRAIN_ANNOUNCEMENT)
}

/// Operative events, newest first.
pub fn operative_events(response: &Value) -> Vec<OperativeEvent> {
    let mut events = records(response, OPERATIVE_EVENT);
    sort_newest_first(&mut events);
    events
}

/// Stable sort by start time (or modification time) descending.
///
/// Unparseable or missing timestamps count as the epoch, so those events sink
/// to the end in their original relative order.
pub fn sort_newest_first(events: &mut [OperativeEvent]) {
    events.sort_by_key(|event| std::cmp::Reverse(event_timestamp_millis(event)));
}

/// Sort key for an event in milliseconds since the epoch.
fn event_timestamp_millis(event: &OperativeEvent) -> i64 {
    event
        .start_date_time
        .as_deref()
        .filter(|s| !s.is_empty())
        .or(event.modified_date_time.as_deref())
        .and_then(parse_timestamp)
        .map_or(0, |t| t.timestamp_millis())
}

/// Parse a provider timestamp.
///
/// Accepts RFC 3339 (the usual form, with offset) and falls back to a bare
/// local-less timestamp interpreted as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<chrono::FixedOffset>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

fn records<T: DeserializeOwned + Default>(response: &Value, object_type: &str) -> Vec<T> {
    result_records(response, object_type)
        .iter()
        .enumerate()
        .map(|(index, record)| {
            T::deserialize(record).unwrap_or_else(|e| {
                warn!(object_type, index, error = %e, "malformed record, keeping it empty");
                T::default()
            })
        })
        .collect()
}

fn string_field(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
