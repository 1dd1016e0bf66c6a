use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use manifest_core::Passenger;
use manifest_report::{html::escape, render_manifest};
use manifest_stats::{flight_directory, FlightListing};
use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

const MANIFEST_TITLE: &str = "Passenger manifest";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(manifest_html))
        .route("/reports/pdf", get(manifest_pdf))
        .route("/reports/flights", get(list_flights))
        .route("/reports/flights/{flight}", get(flight_html))
        .route("/reports/flights/{flight}/pdf", get(flight_pdf))
}

/// Passengers of one flight, matched against the upper-cased path value.
async fn flight_passengers(
    state: &AppState,
    flight: &str,
) -> Result<(String, Vec<Passenger>, Vec<FlightListing>), AppError> {
    let flight = flight.trim().to_uppercase();
    let passengers = state.passengers.list_passengers().await?;
    let directory = flight_directory(&passengers);
    let selected = passengers
        .into_iter()
        .filter(|p| p.flight.to_uppercase() == flight)
        .collect();
    Ok((flight, selected, directory))
}

fn flight_title(flight: &str) -> String {
    format!("{} for flight {}", MANIFEST_TITLE, flight)
}

/// Keep file names to characters every client accepts in a header value.
fn attachment_name(flight: &str) -> String {
    let safe: String = flight
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if safe.is_empty() {
        "manifest.pdf".to_string()
    } else {
        format!("manifest-{}.pdf", safe)
    }
}

fn pdf_response(bytes: Vec<u8>, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// GET /reports
async fn manifest_html(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let passengers = state.passengers.list_passengers().await?;
    Ok(Html(render_manifest(MANIFEST_TITLE, &passengers)))
}

/// GET /reports/pdf
async fn manifest_pdf(State(state): State<AppState>) -> Result<Response, AppError> {
    let passengers = state.passengers.list_passengers().await?;
    let html = render_manifest(MANIFEST_TITLE, &passengers);
    let bytes = state.pdf.render_pdf(&html).await?;
    info!("Generated manifest PDF for {} passengers", passengers.len());
    Ok(pdf_response(bytes, "manifest.pdf"))
}

/// GET /reports/flights
async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<FlightListing>>, AppError> {
    let passengers = state.passengers.list_passengers().await?;
    Ok(Json(flight_directory(&passengers)))
}

/// GET /reports/flights/{flight}
async fn flight_html(
    State(state): State<AppState>,
    Path(flight): Path<String>,
) -> Result<Response, AppError> {
    let (flight, passengers, _) = flight_passengers(&state, &flight).await?;

    if passengers.is_empty() {
        let page = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>Flight not found</title></head>\n\
             <body><h1>Flight {} not found</h1></body>\n</html>\n",
            escape(&flight)
        );
        return Ok((StatusCode::NOT_FOUND, Html(page)).into_response());
    }

    Ok(Html(render_manifest(&flight_title(&flight), &passengers)).into_response())
}

/// GET /reports/flights/{flight}/pdf
async fn flight_pdf(
    State(state): State<AppState>,
    Path(flight): Path<String>,
) -> Result<Response, AppError> {
    let (flight, passengers, directory) = flight_passengers(&state, &flight).await?;

    if passengers.is_empty() {
        let available: Vec<String> = directory.into_iter().map(|l| l.flight).collect();
        let body = Json(json!({
            "error": "Flight not found",
            "flight": flight,
            "availableFlights": available,
        }));
        return Ok((StatusCode::NOT_FOUND, body).into_response());
    }

    let html = render_manifest(&flight_title(&flight), &passengers);
    let bytes = state.pdf.render_pdf(&html).await?;
    info!("Generated manifest PDF for flight {}", flight);
    Ok(pdf_response(bytes, &attachment_name(&flight)))
}
