use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::crew::Crew;
use crate::models::weights::{Factor, PriorityWeights};
use crate::models::zone::ZoneTravelTime;

/// Named strategy key selecting how configured weights are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityMode {
    #[default]
    Balanced,
    FastestAvailable,
}

impl PriorityMode {
    pub fn key(&self) -> &'static str {
        match self {
            PriorityMode::Balanced => "balanced",
            PriorityMode::FastestAvailable => "fastest_available",
        }
    }
}

impl fmt::Display for PriorityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One scoring request. Everything the engine needs is carried here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringContext {
    pub crews: Vec<Crew>,
    pub weights: PriorityWeights,
    #[serde(default)]
    pub mode: PriorityMode,
    #[serde(default)]
    pub crew_override_enabled: bool,
    #[serde(default)]
    pub zone_enforcement: bool,
    /// Most preferred first.
    #[serde(default)]
    pub preferred_crew_ids: Vec<String>,
    #[serde(default)]
    pub job_zone_id: Option<String>,
    /// Hours.
    pub job_duration: f64,
    #[serde(default)]
    pub job_specializations: Vec<String>,
    /// Hours already committed on the target date, by crew id.
    #[serde(default)]
    pub crew_workloads: HashMap<String, f64>,
    /// Jobs already booked on the target date, by crew id.
    #[serde(default)]
    pub crew_job_counts: HashMap<String, u32>,
    #[serde(default)]
    pub travel_times: Vec<ZoneTravelTime>,
}

impl ScoringContext {
    pub fn committed_hours(&self, crew_id: &str) -> f64 {
        self.crew_workloads.get(crew_id).copied().unwrap_or(0.0)
    }

    pub fn committed_jobs(&self, crew_id: &str) -> u32 {
        self.crew_job_counts.get(crew_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub raw: f64,
    pub weighted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrewScore {
    pub crew_id: String,
    pub crew_name: String,
    pub total_score: f64,
    pub committed_hours: f64,
    pub breakdown: BTreeMap<Factor, FactorScore>,
}

/// Why a crew was dropped before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    Inactive,
    #[serde(rename_all = "camelCase")]
    ZoneUnreachable { crew_zone_id: String, job_zone_id: String },
    #[serde(rename_all = "camelCase")]
    MissingSpecialization { required: Vec<String> },
    #[serde(rename_all = "camelCase")]
    HoursExceeded {
        committed_hours: f64,
        requested_hours: f64,
        max_hours_per_day: f64,
    },
    #[serde(rename_all = "camelCase")]
    JobLimitReached { booked_jobs: u32, max_jobs_per_day: u32 },
}

impl ExclusionReason {
    pub fn key(&self) -> &'static str {
        match self {
            ExclusionReason::Inactive => "inactive",
            ExclusionReason::ZoneUnreachable { .. } => "zone_unreachable",
            ExclusionReason::MissingSpecialization { .. } => "missing_specialization",
            ExclusionReason::HoursExceeded { .. } => "hours_exceeded",
            ExclusionReason::JobLimitReached { .. } => "job_limit_reached",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exclusion {
    pub crew_id: String,
    pub crew_name: String,
    pub reason: ExclusionReason,
}

/// Ranked result of one scoring request plus its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringOutcome {
    pub results: Vec<CrewScore>,
    pub winner_id: Option<String>,
    pub winner_name: Option<String>,
    pub override_applied: bool,
    pub mode: PriorityMode,
    pub effective_weights: PriorityWeights,
    pub excluded: Vec<Exclusion>,
}

impl ScoringOutcome {
    pub fn winner(&self) -> Option<&CrewScore> {
        self.winner_id.as_ref().and_then(|_| self.results.first())
    }
}
