//! Station directory.
//!
//! Provides signature → station lookup, fetched from the Trafikverket API
//! once at startup and held for the lifetime of the process.

mod directory;

pub use directory::StationDirectory;
