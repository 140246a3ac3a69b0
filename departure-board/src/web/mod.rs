//! Web layer for the departure board.
//!
//! Serves the timetable page and a small JSON API mirroring the client
//! operations.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
