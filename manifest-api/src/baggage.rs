use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use manifest_core::{BaggageWithPassenger, CoreError, CoreResult, NewBaggage, WeightInput};
use manifest_stats::{fleet_baggage_stats, BaggageStats};
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

/// A bag as it arrives in a request body. `weight` may be a number or a
/// numeric string.
#[derive(Debug, Clone, Deserialize)]
pub struct BaggageRequest {
    pub weight: Option<WeightInput>,
    #[serde(default)]
    pub fragile: bool,
}

impl BaggageRequest {
    pub fn to_new(&self) -> CoreResult<NewBaggage> {
        let weight = self
            .weight
            .as_ref()
            .ok_or_else(|| CoreError::Validation("weight is required".to_string()))?
            .parse()?;

        let bag = NewBaggage {
            weight,
            fragile: self.fragile,
        };
        bag.validate()?;
        Ok(bag)
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/baggage", get(list_baggage))
        .route("/api/baggage/stats", get(baggage_stats))
        .route(
            "/api/baggage/{id}",
            get(get_baggage).put(update_baggage).delete(delete_baggage),
        )
        .route(
            "/api/passengers/{id}/baggage",
            get(list_passenger_baggage).post(add_baggage),
        )
}

async fn list_baggage(
    State(state): State<AppState>,
) -> Result<Json<Vec<BaggageWithPassenger>>, AppError> {
    Ok(Json(state.baggage.list_baggage().await?))
}

/// GET /api/baggage/stats
/// Every flight with at least one passenger appears in `byFlight`, even with no bags
async fn baggage_stats(State(state): State<AppState>) -> Result<Json<BaggageStats>, AppError> {
    let passengers = state.passengers.list_passengers().await?;
    Ok(Json(fleet_baggage_stats(&passengers)))
}

async fn get_baggage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<BaggageWithPassenger>, AppError> {
    Ok(Json(state.baggage.get_baggage(id).await?))
}

async fn update_baggage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<BaggageRequest>,
) -> Result<Json<BaggageWithPassenger>, AppError> {
    let input = req.to_new()?;
    Ok(Json(state.baggage.update_baggage(id, &input).await?))
}

async fn delete_baggage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.baggage.delete_baggage(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_passenger_baggage(
    State(state): State<AppState>,
    Path(passenger_id): Path<i64>,
) -> Result<Json<Vec<BaggageWithPassenger>>, AppError> {
    Ok(Json(
        state.baggage.list_baggage_for_passenger(passenger_id).await?,
    ))
}

async fn add_baggage(
    State(state): State<AppState>,
    Path(passenger_id): Path<i64>,
    AppJson(req): AppJson<BaggageRequest>,
) -> Result<(StatusCode, Json<BaggageWithPassenger>), AppError> {
    let input = req.to_new()?;
    let bag = state.baggage.add_baggage(passenger_id, &input).await?;
    info!("Added bag {} to passenger {}", bag.bag.id, passenger_id);
    Ok((StatusCode::CREATED, Json(bag)))
}
