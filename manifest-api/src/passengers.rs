use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use manifest_core::{CoreResult, NewPassenger, Passenger};
use manifest_stats::{passenger_baggage_stats, PassengerBaggageReport};
use serde::Deserialize;
use tracing::info;

use crate::baggage::BaggageRequest;
use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Body of passenger create and update. Missing text fields are reported as
/// validation errors rather than rejected by the extractor.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassengerRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub flight: String,
    #[serde(default)]
    pub scheduled_time: String,
    #[serde(default)]
    pub bags: Vec<BaggageRequest>,
}

impl PassengerRequest {
    pub fn into_new(self) -> CoreResult<NewPassenger> {
        let bags = self
            .bags
            .iter()
            .map(BaggageRequest::to_new)
            .collect::<CoreResult<Vec<_>>>()?;

        let input = NewPassenger {
            name: self.name,
            number: self.number,
            flight: self.flight,
            scheduled_time: self.scheduled_time,
            bags,
        };
        input.validate()?;
        Ok(input)
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/passengers", get(list_passengers).post(create_passenger))
        .route(
            "/api/passengers/{id}",
            get(get_passenger).put(update_passenger).delete(delete_passenger),
        )
        .route("/api/passengers/{id}/stats", get(passenger_stats))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/passengers
async fn list_passengers(State(state): State<AppState>) -> Result<Json<Vec<Passenger>>, AppError> {
    Ok(Json(state.passengers.list_passengers().await?))
}

/// GET /api/passengers/{id}
async fn get_passenger(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Passenger>, AppError> {
    Ok(Json(state.passengers.get_passenger(id).await?))
}

/// POST /api/passengers
async fn create_passenger(
    State(state): State<AppState>,
    AppJson(req): AppJson<PassengerRequest>,
) -> Result<(StatusCode, Json<Passenger>), AppError> {
    let input = req.into_new()?;
    let passenger = state.passengers.create_passenger(&input).await?;
    info!("Created passenger {} ({})", passenger.id, passenger.number);
    Ok((StatusCode::CREATED, Json(passenger)))
}

/// PUT /api/passengers/{id}
/// Overwrites the passenger and replaces its whole bag list
async fn update_passenger(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<PassengerRequest>,
) -> Result<Json<Passenger>, AppError> {
    let input = req.into_new()?;
    Ok(Json(state.passengers.update_passenger(id, &input).await?))
}

/// DELETE /api/passengers/{id}
async fn delete_passenger(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.passengers.delete_passenger(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/passengers/{id}/stats
async fn passenger_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PassengerBaggageReport>, AppError> {
    let passenger = state.passengers.get_passenger(id).await?;
    Ok(Json(passenger_baggage_stats(&passenger)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifest_core::{CoreError, Weight};

    #[test]
    fn test_request_with_string_and_number_weights() {
        let req: PassengerRequest = serde_json::from_value(serde_json::json!({
            "name": "João Silva",
            "number": "001",
            "flight": "AZ123",
            "scheduledTime": "10:30",
            "bags": [{ "weight": 23, "fragile": false }, { "weight": "12.5" }]
        }))
        .unwrap();

        let input = req.into_new().unwrap();
        assert_eq!(input.bags[0].weight, Weight::from_units(23));
        assert_eq!(input.bags[1].weight, Weight::from_hundredths(1250));
        assert!(!input.bags[1].fragile);
    }

    #[test]
    fn test_request_missing_fields_is_validation_error() {
        let req: PassengerRequest =
            serde_json::from_value(serde_json::json!({ "name": "Ana Lima" })).unwrap();
        assert!(matches!(req.into_new(), Err(CoreError::Validation(_))));
    }
}
