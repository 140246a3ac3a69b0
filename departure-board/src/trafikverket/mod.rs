//! Trafikverket open data API client.
//!
//! This module talks to the Trafikverket traffic information API, which
//! answers filtered queries over object types such as `TrainStation`,
//! `TrainAnnouncement` and `OperativeEvent`.
//!
//! Key characteristics of the API:
//! - Every request is a single POST carrying the authentication key inside
//!   the body (XML or JSON), never in a header
//! - Results come wrapped as `RESPONSE.RESULT[0].<ObjectType>`
//! - Not every key has access to every object type; `OperativeEvent` in
//!   particular may be missing, which is reported as a query error

mod client;
mod error;
mod features;
pub mod mock;
mod normalize;
mod query;
mod transport;
mod types;

#[cfg(test)]
mod client_tests;

pub use client::{EventFeed, TrafikverketClient};
pub use error::TrafikverketError;
pub use features::{FeatureAvailability, OPERATIVE_EVENT_UNSUPPORTED};
pub use normalize::parse_timestamp;
pub use query::{ActivityType, CompareOp, DepartureWindow, Filter, Query, WireFormat};
pub use transport::{Backend, HttpBackend, RawResponse, Transport, WireRequest};
pub use types::{
    Departure, Deviation, EventSection, EventType, LocationDetail, LocationRef, OperativeEvent,
    SectionLocation, Station,
};
