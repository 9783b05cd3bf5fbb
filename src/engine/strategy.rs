//! Priority modes as weight presets.
//!
//! A strategy only decides which weights the engine applies. Adding a mode
//! means adding a [`PriorityMode`] variant and a strategy here; the engine
//! core stays untouched.

use std::fmt::Debug;

use crate::models::scoring::PriorityMode;
use crate::models::weights::PriorityWeights;

pub trait ScoringStrategy: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Effective weights derived from the company's configured weights.
    fn weights(&self, configured: &PriorityWeights) -> PriorityWeights;
}

/// Uses the configured weights as they are.
#[derive(Debug, Clone, Copy)]
pub struct Balanced;

impl ScoringStrategy for Balanced {
    fn name(&self) -> &'static str {
        "balanced"
    }

    fn weights(&self, configured: &PriorityWeights) -> PriorityWeights {
        *configured
    }
}

/// Favors the closest crew, then the least loaded one. Specialization and
/// preference weights are carried over from configuration.
#[derive(Debug, Clone, Copy)]
pub struct FastestAvailable;

const FASTEST_TRAVEL_WEIGHT: f64 = 0.6;
const FASTEST_WORKLOAD_WEIGHT: f64 = 0.3;

impl ScoringStrategy for FastestAvailable {
    fn name(&self) -> &'static str {
        "fastest_available"
    }

    fn weights(&self, configured: &PriorityWeights) -> PriorityWeights {
        PriorityWeights {
            travel: FASTEST_TRAVEL_WEIGHT,
            workload: FASTEST_WORKLOAD_WEIGHT,
            ..*configured
        }
    }
}

pub fn strategy_for(mode: PriorityMode) -> &'static dyn ScoringStrategy {
    match mode {
        PriorityMode::Balanced => &Balanced,
        PriorityMode::FastestAvailable => &FastestAvailable,
    }
}

#[cfg(test)]
mod tests {
    use super::strategy_for;
    use crate::models::scoring::PriorityMode;
    use crate::models::weights::PriorityWeights;

    #[test]
    fn balanced_keeps_configured_weights() {
        let configured = PriorityWeights {
            workload: 3.0,
            travel: 0.0,
            specialization: 1.0,
            preference: 2.0,
        };
        let strategy = strategy_for(PriorityMode::Balanced);

        assert_eq!(strategy.name(), "balanced");
        assert_eq!(strategy.weights(&configured), configured);
    }

    #[test]
    fn fastest_available_emphasizes_travel() {
        let configured = PriorityWeights {
            workload: 3.0,
            travel: 0.0,
            specialization: 1.0,
            preference: 2.0,
        };
        let weights = strategy_for(PriorityMode::FastestAvailable).weights(&configured);

        assert!(weights.travel > weights.workload);
        assert_eq!(weights.specialization, 1.0);
        assert_eq!(weights.preference, 2.0);
    }

    #[test]
    fn mode_names_match_strategy_names() {
        for mode in [PriorityMode::Balanced, PriorityMode::FastestAvailable] {
            assert_eq!(strategy_for(mode).name(), mode.key());
        }
    }
}
