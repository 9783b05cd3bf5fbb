use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::BookingOrchestrator;
use crate::error::AppError;
use crate::models::booking::{Booking, BookingRequest};
use crate::state::AppState;
use crate::store::BookingWriter;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route("/bookings/:id/assign", post(assign_booking))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    pub company_id: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub crew_id: String,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingOrchestrator::from_state(&state).book(payload)?;
    Ok(Json(booking))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingQuery>,
) -> Json<Vec<Booking>> {
    Json(
        state
            .store
            .bookings_for(query.company_id.as_deref(), query.date),
    )
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    state
        .store
        .booking(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingOrchestrator::from_state(&state).cancel(id)?;
    Ok(Json(booking))
}

async fn assign_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = BookingOrchestrator::from_state(&state).assign_manually(id, &payload.crew_id)?;
    Ok(Json(booking))
}
