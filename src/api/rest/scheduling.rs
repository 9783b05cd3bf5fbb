use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::error::AppError;
use crate::models::scheduling::SchedulingConfig;
use crate::state::AppState;
use crate::store::SchedulingConfigReader;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/companies/:company_id/scheduling-config",
        get(get_config).put(put_config),
    )
}

async fn put_config(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
    Json(payload): Json<SchedulingConfig>,
) -> Result<Json<SchedulingConfig>, AppError> {
    payload.weights.validate()?;

    state.store.configs.insert(company_id.clone(), payload.clone());
    tracing::info!(
        company_id = %company_id,
        mode = %payload.mode,
        crew_override_enabled = payload.crew_override_enabled,
        zone_enforcement = payload.zone_enforcement,
        "scheduling config updated"
    );
    Ok(Json(payload))
}

async fn get_config(
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
) -> Result<Json<SchedulingConfig>, AppError> {
    state
        .store
        .scheduling_config(&company_id)
        .map(Json)
        .ok_or(AppError::ConfigurationMissing(company_id))
}
