use axum::{extract::State, routing::get, Json, Router};
use manifest_stats::{flight_stats, FlightReport};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/flights/stats", get(get_flight_stats))
}

/// GET /api/flights/stats
async fn get_flight_stats(State(state): State<AppState>) -> Result<Json<FlightReport>, AppError> {
    let passengers = state.passengers.list_passengers().await?;
    Ok(Json(flight_stats(&passengers)))
}
