use std::collections::HashSet;

use crate::models::crew::{normalize_tag, Crew};
use crate::models::scoring::ScoringContext;
use crate::models::weights::Factor;
use crate::models::zone::TravelTable;

/// Travel time at which the travel score reaches zero.
pub const TRAVEL_CEILING_MINUTES: f64 = 60.0;
/// Score used when travel time between zones is not known.
pub const UNKNOWN_TRAVEL_SCORE: f64 = 0.5;
/// Score step between consecutive entries of the preferred-crew list.
pub const PREFERENCE_STEP: f64 = 0.01;

/// Per-request data shared by all scorers.
pub struct FactorInputs<'a> {
    pub context: &'a ScoringContext,
    pub travel: &'a TravelTable,
    pub required: &'a HashSet<String>,
}

pub fn score(factor: Factor, crew: &Crew, inputs: &FactorInputs<'_>) -> f64 {
    let raw = match factor {
        Factor::Workload => workload_score(inputs.context.committed_hours(&crew.id), crew.max_hours_per_day),
        Factor::Travel => travel_score(
            crew.home_zone_id.as_deref(),
            inputs.context.job_zone_id.as_deref(),
            inputs.travel,
        ),
        Factor::Specialization => specialization_score(crew, inputs.required),
        Factor::Preference => preference_score(&crew.id, &inputs.context.preferred_crew_ids),
    };
    raw.clamp(0.0, 1.0)
}

pub fn workload_score(committed_hours: f64, max_hours_per_day: f64) -> f64 {
    if max_hours_per_day <= 0.0 {
        return 0.0;
    }

    (1.0 - committed_hours / max_hours_per_day).clamp(0.0, 1.0)
}

pub fn travel_score(crew_zone: Option<&str>, job_zone: Option<&str>, travel: &TravelTable) -> f64 {
    let Some(job_zone) = job_zone else {
        return 1.0;
    };
    let Some(crew_zone) = crew_zone else {
        return UNKNOWN_TRAVEL_SCORE;
    };
    if crew_zone == job_zone {
        return 1.0;
    }

    match travel.between(crew_zone, job_zone) {
        Some(minutes) => (1.0 - minutes as f64 / TRAVEL_CEILING_MINUTES).clamp(0.0, 1.0),
        None => UNKNOWN_TRAVEL_SCORE,
    }
}

/// Fraction of the required tags the crew covers.
pub fn specialization_score(crew: &Crew, required: &HashSet<String>) -> f64 {
    if required.is_empty() {
        return 1.0;
    }

    let covered: HashSet<String> = crew
        .specializations
        .iter()
        .map(|tag| normalize_tag(tag))
        .filter(|tag| required.contains(tag))
        .collect();

    covered.len() as f64 / required.len() as f64
}

pub fn preference_score(crew_id: &str, preferred: &[String]) -> f64 {
    match preferred.iter().position(|id| id == crew_id) {
        Some(index) => (1.0 - index as f64 * PREFERENCE_STEP).max(0.0),
        None => 0.0,
    }
}
