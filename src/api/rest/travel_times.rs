use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::zone::ZoneTravelTime;
use crate::state::AppState;
use crate::store::TravelTimeRepository;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/travel-times", get(list_travel_times).put(upsert_travel_time))
        .route("/travel-times/:id", delete(delete_travel_time))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertTravelTimeRequest {
    pub company_id: String,
    pub from_zone_id: String,
    pub to_zone_id: String,
    pub travel_minutes: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelTimeQuery {
    pub company_id: String,
}

async fn upsert_travel_time(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpsertTravelTimeRequest>,
) -> Result<Json<ZoneTravelTime>, AppError> {
    if payload.company_id.trim().is_empty() {
        return Err(AppError::BadRequest("companyId cannot be empty".to_string()));
    }
    if payload.from_zone_id.trim().is_empty() || payload.to_zone_id.trim().is_empty() {
        return Err(AppError::BadRequest("zone ids cannot be empty".to_string()));
    }

    let entry = state.store.upsert_travel_time(ZoneTravelTime {
        id: Uuid::new_v4().to_string(),
        company_id: payload.company_id,
        from_zone_id: payload.from_zone_id,
        to_zone_id: payload.to_zone_id,
        travel_minutes: payload.travel_minutes,
    });

    Ok(Json(entry))
}

async fn list_travel_times(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TravelTimeQuery>,
) -> Json<Vec<ZoneTravelTime>> {
    Json(state.store.travel_times(&query.company_id))
}

async fn delete_travel_time(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ZoneTravelTime>, AppError> {
    state
        .store
        .remove_travel_time(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("travel time {} not found", id)))
}
