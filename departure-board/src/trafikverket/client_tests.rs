//! End-to-end tests for the client against the scripted backend.

use std::time::Duration;

use serde_json::{Value, json};

use super::mock::MockBackend;
use super::*;
use crate::config::ApiConfig;

fn client_with(config: ApiConfig) -> (TrafikverketClient<MockBackend>, MockBackend) {
    let backend = MockBackend::new();
    let client = TrafikverketClient::with_backend(config, backend.clone());
    (client, backend)
}

fn client() -> (TrafikverketClient<MockBackend>, MockBackend) {
    client_with(ApiConfig::new("test-key").with_timeout(Duration::from_millis(200)))
}

fn envelope(object_type: &str, records: Value) -> Value {
    json!({ "RESPONSE": { "RESULT": [{ object_type: records }] } })
}

const UNSUPPORTED_BODY: &str = r#"{"RESPONSE":{"RESULT":[{"ERROR":{"SOURCE":"Request","MESSAGE":"ObjectType 'OperativeEvent' does not exists"}}]}}"#;

#[tokio::test]
async fn stations_in_input_order() {
    let (client, backend) = client();
    backend.push_json(
        200,
        envelope(
            "TrainStation",
            json!([
                { "AdvertisedLocationName": "Stockholm C", "LocationSignature": "Cst", "Prognosticated": true },
                { "AdvertisedLocationName": "Göteborg C", "LocationSignature": "G", "Prognosticated": false },
            ]),
        ),
    );

    let stations = client.fetch_stations().await.unwrap();

    assert_eq!(stations.len(), 2);
    assert_eq!(stations[0].sign, "Cst");
    assert!(stations[0].prognosticated);
    assert_eq!(stations[1].sign, "G");
    assert!(!stations[1].prognosticated);
}

#[tokio::test]
async fn stations_missing_array_is_empty() {
    let (client, backend) = client();
    backend.push_json(200, json!({ "RESPONSE": { "RESULT": [{}] } }));

    assert!(client.fetch_stations().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_credential_makes_no_call() {
    let (client, backend) = client_with(ApiConfig::new(""));

    let err = client.fetch_stations().await.unwrap_err();

    assert!(matches!(err, TrafikverketError::Configuration(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn server_error_is_remote_error() {
    let (client, backend) = client();
    backend.push_text(500, "Internal error");

    let err = client.fetch_departures("Cst").await.unwrap_err();

    assert!(matches!(err, TrafikverketError::Remote { status: 500, .. }));
    let msg = err.to_string();
    assert!(msg.contains("500"));
    assert!(msg.contains("Internal error"));
}

#[tokio::test]
async fn non_json_success_is_format_error() {
    let (client, backend) = client();
    backend.push_text(200, "<html>maintenance</html>");

    let err = client.fetch_stations().await.unwrap_err();

    match err {
        TrafikverketError::ResponseFormat { body, .. } => {
            assert_eq!(body, "<html>maintenance</html>");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn departures_query_targets_signature() {
    let (client, backend) = client();
    backend.push_json(
        200,
        envelope(
            "TrainAnnouncement",
            json!([
                { "AdvertisedTimeAtLocation": "2025-03-01T10:00:00.000+01:00", "ToLocation": [{ "LocationName": "G" }] },
                { "AdvertisedTimeAtLocation": "2025-03-01T10:05:00.000+01:00", "Canceled": true },
            ]),
        ),
    );

    let departures = client.fetch_departures("Cst").await.unwrap();
    assert_eq!(departures.len(), 2);
    assert!(departures[1].is_cancelled());

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_str(&requests[0].body).unwrap();
    let query = &body["request"]["query"][0];
    assert_eq!(query["objecttype"], "TrainAnnouncement");
    assert_eq!(
        query["filter"]["AND"][1],
        json!({ "EQ": { "name": "LocationSignature", "value": "Cst" } })
    );
    assert_eq!(body["request"]["login"]["authenticationkey"], "test-key");
}

#[tokio::test]
async fn empty_signature_is_rejected_without_call() {
    let (client, backend) = client();

    let err = client.fetch_departures("  ").await.unwrap_err();

    assert!(matches!(err, TrafikverketError::InvalidRequest(_)));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn disabled_by_config_makes_no_call() {
    let (client, backend) = client_with(
        ApiConfig::new("test-key").with_operative_events_disabled(true),
    );

    let feed = client.fetch_operative_events().await.unwrap();

    assert_eq!(feed, EventFeed::Unavailable);
    assert!(feed.events().is_empty());
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn unsupported_object_type_disables_for_session() {
    let (client, backend) = client();
    backend.push_text(400, UNSUPPORTED_BODY);

    let first = client.fetch_operative_events().await.unwrap();
    assert_eq!(first, EventFeed::Unavailable);
    assert_eq!(backend.call_count(), 1);
    assert!(!client.features().operative_events_available());

    for _ in 0..3 {
        let again = client.fetch_operative_events().await.unwrap();
        assert!(again.events().is_empty());
        assert!(!again.is_available());
    }
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn unsupported_object_type_inside_success_document() {
    let (client, backend) = client();
    backend.push_text(200, UNSUPPORTED_BODY);

    assert_eq!(
        client.fetch_operative_events().await.unwrap(),
        EventFeed::Unavailable
    );
    assert!(!client.features().operative_events_available());
}

#[tokio::test]
async fn other_event_errors_propagate() {
    let (client, backend) = client();
    backend.push_text(500, "Internal error");

    let err = client.fetch_operative_events().await.unwrap_err();

    assert!(matches!(err, TrafikverketError::Remote { .. }));
    assert!(client.features().operative_events_available());
}

#[tokio::test]
async fn events_sorted_newest_first() {
    let (client, backend) = client();
    backend.push_json(
        200,
        envelope(
            "OperativeEvent",
            json!([
                { "EventId": "a", "StartDateTime": "2025-03-01T08:00:00.000+01:00" },
                { "EventId": "b", "StartDateTime": "???" },
                { "EventId": "c", "StartDateTime": "2025-03-01T09:00:00.000+01:00" },
            ]),
        ),
    );

    let feed = client.fetch_operative_events().await.unwrap();
    let ids: Vec<_> = feed
        .into_events()
        .into_iter()
        .filter_map(|e| e.event_id)
        .collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn zero_events_is_still_available() {
    let (client, backend) = client();
    backend.push_json(200, envelope("OperativeEvent", json!([])));

    let feed = client.fetch_operative_events().await.unwrap();

    assert_eq!(feed, EventFeed::Active(Vec::new()));
    assert!(feed.is_available());
}

#[tokio::test]
async fn timeout_aborts_and_reports() {
    let (client, backend) = client();
    backend.push_hang();

    let err = client.fetch_departures("Cst").await.unwrap_err();

    assert!(matches!(err, TrafikverketError::Timeout { .. }));
    assert!(err.is_retryable());
    assert_eq!(backend.in_flight(), 0);
}

#[tokio::test]
async fn each_call_is_a_new_request() {
    let (client, backend) = client();
    backend.push_json(200, envelope("TrainAnnouncement", json!([])));
    backend.push_json(200, envelope("TrainAnnouncement", json!([])));

    client.fetch_departures("Cst").await.unwrap();
    client.fetch_departures("Cst").await.unwrap();

    assert_eq!(backend.call_count(), 2);
}
