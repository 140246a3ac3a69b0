//! Swedish railway departure board.
//!
//! A small web application over the Trafikverket open data API: pick a
//! station, see its upcoming departures, and keep an eye on active
//! operative events across the network.

pub mod config;
pub mod stations;
pub mod trafikverket;
pub mod web;
