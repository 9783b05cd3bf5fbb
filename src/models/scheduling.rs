use serde::{Deserialize, Serialize};

use crate::models::scoring::PriorityMode;
use crate::models::weights::PriorityWeights;

/// Per-company scheduling settings read by the booking orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingConfig {
    pub weights: PriorityWeights,
    #[serde(default)]
    pub mode: PriorityMode,
    #[serde(default)]
    pub crew_override_enabled: bool,
    #[serde(default)]
    pub zone_enforcement: bool,
}
