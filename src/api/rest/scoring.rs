use std::sync::Arc;

use axum::routing::post;
use axum::Json;
use axum::Router;

use crate::engine::run_scoring_engine;
use crate::error::AppError;
use crate::models::scoring::{ScoringContext, ScoringOutcome};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/scoring/preview", post(preview))
}

/// Runs the engine on a caller-supplied context without storing anything.
async fn preview(Json(context): Json<ScoringContext>) -> Result<Json<ScoringOutcome>, AppError> {
    let outcome = run_scoring_engine(&context)?;
    Ok(Json(outcome))
}
