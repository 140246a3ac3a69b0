//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::services::ServeDir;
use tracing::{error, warn};

use crate::trafikverket::{
    ActivityType, Backend, Departure, EventFeed, LocationRef, Station, TrafikverketError,
};

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router<B: Backend + 'static>(state: AppState<B>, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(board_page::<B>))
        .route("/departures", get(board_page::<B>))
        .route("/health", get(health))
        .route("/api/stations", get(api_stations::<B>))
        .route("/api/departures/:sign", get(api_departures::<B>))
        .route("/api/events", get(api_events::<B>))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The timetable page.
///
/// Always renders: every failure ends up as a status message or a
/// placeholder rather than an error page.
async fn board_page<B: Backend + 'static>(
    State(state): State<AppState<B>>,
    Query(req): Query<BoardRequest>,
) -> Result<Html<String>, AppError> {
    let input = req
        .station
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let board_fut = async {
        match &input {
            Some(input) => Some(load_board(&state, input).await),
            None => None,
        }
    };
    let (board, events) = futures::join!(board_fut, load_events(&state));

    let stations: Vec<StationOption> = state
        .stations
        .selectable()
        .await
        .into_iter()
        .map(StationOption::from)
        .collect();

    let (board, status) = match board {
        Some((board, status)) => (board, status),
        None => (None, station_status(&state, stations.len())),
    };

    let template = BoardTemplate {
        status,
        stations,
        query: input.unwrap_or_default(),
        board_label: board_label(state.client.window().activity),
        board,
        events,
    };
    let html = template.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {e}"),
    })?;

    Ok(Html(html))
}

fn board_label(activity: ActivityType) -> &'static str {
    match activity {
        ActivityType::Departure => "Departures",
        ActivityType::Arrival => "Arrivals",
    }
}

fn station_status<B>(state: &AppState<B>, selectable: usize) -> StatusView {
    match &state.stations_error {
        Some(message) => StatusView::error(format!("Could not load stations: {message}")),
        None => StatusView::success(format!("Ready – {selectable} stations")),
    }
}

/// Resolve the user's input and fetch the board for it.
async fn load_board<B: Backend>(
    state: &AppState<B>,
    input: &str,
) -> (Option<BoardView>, StatusView) {
    let Some(sign) = state.stations.resolve(input).await else {
        return (
            None,
            StatusView::error("Select a station from the list or enter a signature."),
        );
    };

    let label = board_label(state.client.window().activity).to_lowercase();

    match state.client.fetch_departures(&sign).await {
        Ok(departures) => {
            let mut rows = Vec::with_capacity(departures.len());
            for departure in &departures {
                let destinations = state
                    .stations
                    .display_names(departure.to_location.iter().filter_map(LocationRef::key))
                    .await;
                rows.push(DepartureView::from_departure(departure, &destinations));
            }
            let name = state.stations.display_name(&sign).await;
            (
                Some(BoardView { rows }),
                StatusView::info(format!("Showing {label} for {name}")),
            )
        }
        Err(e) => {
            warn!(signature = %sign, error = %e, "could not fetch departures");
            (Some(BoardView { rows: Vec::new() }), StatusView::error(e.to_string()))
        }
    }
}

/// Fetch operative events and turn them into the events list.
async fn load_events<B: Backend>(state: &AppState<B>) -> EventsView {
    match state.client.fetch_operative_events().await {
        Ok(EventFeed::Unavailable) => EventsView::unavailable(),
        Ok(EventFeed::Active(events)) => {
            let mut items = Vec::new();
            for event in events.iter().take(MAX_EVENTS) {
                let mut sections = Vec::with_capacity(event.event_section.len());
                for section in &event.event_section {
                    sections.push(state.stations.display_names(section.signatures()).await);
                }
                items.push(EventView::from_event(event, &sections));
            }
            EventsView::list(items)
        }
        Err(e) => {
            warn!(error = %e, "could not load events");
            EventsView::failed()
        }
    }
}

/// All stations, fetched fresh.
async fn api_stations<B: Backend + 'static>(
    State(state): State<AppState<B>>,
) -> Result<Json<Vec<Station>>, AppError> {
    Ok(Json(state.client.fetch_stations().await?))
}

/// Raw announcements at a station signature.
async fn api_departures<B: Backend + 'static>(
    State(state): State<AppState<B>>,
    Path(sign): Path<String>,
) -> Result<Json<Vec<Departure>>, AppError> {
    Ok(Json(state.client.fetch_departures(&sign).await?))
}

/// Active operative events, newest first.
async fn api_events<B: Backend + 'static>(
    State(state): State<AppState<B>>,
) -> Result<Json<EventsResponse>, AppError> {
    let feed = state.client.fetch_operative_events().await?;
    Ok(Json(EventsResponse {
        available: feed.is_available(),
        events: feed.into_events(),
    }))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Upstream { message: String },
    GatewayTimeout { message: String },
    Internal { message: String },
}

impl From<TrafikverketError> for AppError {
    fn from(e: TrafikverketError) -> Self {
        let message = e.to_string();
        match e {
            TrafikverketError::InvalidRequest(_) => AppError::BadRequest { message },
            TrafikverketError::Timeout { .. } => AppError::GatewayTimeout { message },
            TrafikverketError::Configuration(_) => AppError::Internal { message },
            TrafikverketError::Remote { .. }
            | TrafikverketError::ResponseFormat { .. }
            | TrafikverketError::Http(_) => AppError::Upstream { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::GatewayTimeout { message } => (StatusCode::GATEWAY_TIMEOUT, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, "{message}");
        } else {
            warn!(%status, "{message}");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
