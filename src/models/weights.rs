use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScoringError;

/// A weighted scoring dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Workload,
    Travel,
    Specialization,
    Preference,
}

impl Factor {
    pub const ALL: [Factor; 4] = [
        Factor::Workload,
        Factor::Travel,
        Factor::Specialization,
        Factor::Preference,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Factor::Workload => "workload",
            Factor::Travel => "travel",
            Factor::Specialization => "specialization",
            Factor::Preference => "preference",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relative importance of each factor. Weights need not sum to 1, the
/// engine normalizes by their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PriorityWeights {
    pub workload: f64,
    pub travel: f64,
    pub specialization: f64,
    pub preference: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            workload: 1.0,
            travel: 1.0,
            specialization: 1.0,
            preference: 1.0,
        }
    }
}

impl PriorityWeights {
    pub fn zero() -> Self {
        Self {
            workload: 0.0,
            travel: 0.0,
            specialization: 0.0,
            preference: 0.0,
        }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Workload => self.workload,
            Factor::Travel => self.travel,
            Factor::Specialization => self.specialization,
            Factor::Preference => self.preference,
        }
    }

    pub fn with(mut self, factor: Factor, weight: f64) -> Self {
        match factor {
            Factor::Workload => self.workload = weight,
            Factor::Travel => self.travel = weight,
            Factor::Specialization => self.specialization = weight,
            Factor::Preference => self.preference = weight,
        }
        self
    }

    pub fn sum(&self) -> f64 {
        Factor::ALL.iter().map(|factor| self.get(*factor)).sum()
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        for factor in Factor::ALL {
            let weight = self.get(factor);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoringError::InvalidInput(format!(
                    "weight for {factor} must be a finite value >= 0, got {weight}"
                )));
            }
        }
        Ok(())
    }
}
