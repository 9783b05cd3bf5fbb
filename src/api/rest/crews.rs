use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::crew::{normalize_tag, Crew};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/crews", post(create_crew).get(list_crews))
        .route("/crews/:id", get(get_crew).patch(update_crew))
        .route("/crews/:id/status", patch(update_crew_status))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCrewRequest {
    pub company_id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub home_zone_id: Option<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    pub max_hours_per_day: f64,
    pub max_jobs_per_day: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCrewRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub home_zone_id: Option<String>,
    pub specializations: Option<Vec<String>>,
    pub max_hours_per_day: Option<f64>,
    pub max_jobs_per_day: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewQuery {
    pub company_id: Option<String>,
}

async fn create_crew(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCrewRequest>,
) -> Result<Json<Crew>, AppError> {
    if payload.company_id.trim().is_empty() {
        return Err(AppError::BadRequest("companyId cannot be empty".to_string()));
    }

    let crew = Crew {
        id: Uuid::new_v4().to_string(),
        company_id: payload.company_id,
        name: payload.name,
        color: payload.color,
        home_zone_id: payload.home_zone_id.filter(|zone| !zone.trim().is_empty()),
        specializations: clean_tags(payload.specializations),
        max_hours_per_day: payload.max_hours_per_day,
        max_jobs_per_day: payload.max_jobs_per_day,
        is_active: payload.is_active,
    };
    validate_crew(&crew)?;

    state.store.crews.insert(crew.id.clone(), crew.clone());
    tracing::info!(crew_id = %crew.id, company_id = %crew.company_id, "crew created");
    Ok(Json(crew))
}

async fn list_crews(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CrewQuery>,
) -> Json<Vec<Crew>> {
    Json(state.store.crews_for(query.company_id.as_deref()))
}

async fn get_crew(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Crew>, AppError> {
    let crew = state
        .store
        .crews
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("crew {} not found", id)))?;

    Ok(Json(crew.value().clone()))
}

async fn update_crew(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCrewRequest>,
) -> Result<Json<Crew>, AppError> {
    let mut crew = state
        .store
        .crews
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("crew {} not found", id)))?;

    let mut updated = crew.clone();
    if let Some(name) = payload.name {
        updated.name = name;
    }
    if let Some(color) = payload.color {
        updated.color = Some(color);
    }
    if let Some(zone) = payload.home_zone_id {
        updated.home_zone_id = Some(zone).filter(|zone| !zone.trim().is_empty());
    }
    if let Some(tags) = payload.specializations {
        updated.specializations = clean_tags(tags);
    }
    if let Some(hours) = payload.max_hours_per_day {
        updated.max_hours_per_day = hours;
    }
    if let Some(jobs) = payload.max_jobs_per_day {
        updated.max_jobs_per_day = jobs;
    }
    validate_crew(&updated)?;

    *crew = updated;
    Ok(Json(crew.clone()))
}

async fn update_crew_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Crew>, AppError> {
    let mut crew = state
        .store
        .crews
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("crew {} not found", id)))?;

    let mut updated = crew.clone();
    updated.is_active = payload.is_active;
    validate_crew(&updated)?;

    *crew = updated;
    Ok(Json(crew.clone()))
}

fn validate_crew(crew: &Crew) -> Result<(), AppError> {
    if crew.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }
    if !crew.max_hours_per_day.is_finite() || crew.max_hours_per_day < 0.0 {
        return Err(AppError::BadRequest(
            "maxHoursPerDay must be a finite value >= 0".to_string(),
        ));
    }
    // Inactive crews may keep zero capacity, active ones may not.
    if crew.is_active && crew.max_hours_per_day <= 0.0 {
        return Err(AppError::BadRequest("maxHoursPerDay must be > 0".to_string()));
    }
    if crew.is_active && crew.max_jobs_per_day == 0 {
        return Err(AppError::BadRequest("maxJobsPerDay must be > 0".to_string()));
    }
    Ok(())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = tags
        .iter()
        .map(|tag| normalize_tag(tag))
        .filter(|tag| !tag.is_empty())
        .collect();
    cleaned.sort();
    cleaned.dedup();
    cleaned
}
