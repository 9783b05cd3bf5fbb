use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::engine::eligibility::{filter_eligible, required_tags};
use crate::engine::factors::{self, FactorInputs};
use crate::engine::strategy::strategy_for;
use crate::error::ScoringError;
use crate::models::crew::Crew;
use crate::models::scoring::{CrewScore, FactorScore, ScoringContext, ScoringOutcome};
use crate::models::weights::{Factor, PriorityWeights};
use crate::models::zone::TravelTable;

/// Totals closer than this are ties.
pub const SCORE_EPSILON: f64 = 1e-9;
const OVERRIDE_SCORE: f64 = 1.0;

/// Scores every eligible crew for one job and picks a winner.
///
/// An empty eligible set is a valid outcome with no winner. Only malformed
/// input is an error.
pub fn run_scoring_engine(context: &ScoringContext) -> Result<ScoringOutcome, ScoringError> {
    validate(context)?;

    let travel = TravelTable::build(&context.travel_times)?;
    let weights = strategy_for(context.mode).weights(&context.weights);
    weights.validate()?;

    let report = filter_eligible(context, &travel);
    if report.eligible.is_empty() {
        return Ok(ScoringOutcome {
            results: Vec::new(),
            winner_id: None,
            winner_name: None,
            override_applied: false,
            mode: context.mode,
            effective_weights: weights,
            excluded: report.excluded,
        });
    }

    let required = required_tags(&context.job_specializations);
    let inputs = FactorInputs {
        context,
        travel: &travel,
        required: &required,
    };

    let mut results: Vec<CrewScore> = report
        .eligible
        .iter()
        .map(|crew| score_crew(crew, &inputs, &weights))
        .collect();

    rank(&mut results);

    let override_applied = apply_override(context, &mut results);

    let (winner_id, winner_name) = results
        .first()
        .map(|top| (Some(top.crew_id.clone()), Some(top.crew_name.clone())))
        .unwrap_or((None, None));

    Ok(ScoringOutcome {
        results,
        winner_id,
        winner_name,
        override_applied,
        mode: context.mode,
        effective_weights: weights,
        excluded: report.excluded,
    })
}

fn validate(context: &ScoringContext) -> Result<(), ScoringError> {
    if !context.job_duration.is_finite() || context.job_duration <= 0.0 {
        return Err(ScoringError::InvalidInput(format!(
            "job duration must be > 0 hours, got {}",
            context.job_duration
        )));
    }

    context.weights.validate()?;

    if let Some((crew_id, hours)) = context
        .crew_workloads
        .iter()
        .find(|(_, hours)| !hours.is_finite() || **hours < 0.0)
    {
        return Err(ScoringError::InvalidInput(format!(
            "workload for crew {crew_id} must be >= 0 hours, got {hours}"
        )));
    }

    Ok(())
}

fn score_crew(crew: &Crew, inputs: &FactorInputs<'_>, weights: &PriorityWeights) -> CrewScore {
    let weight_sum = weights.sum();
    let mut breakdown = BTreeMap::new();
    let mut total = 0.0;

    for factor in Factor::ALL {
        let raw = factors::score(factor, crew, inputs);
        let weighted = if weight_sum > 0.0 {
            raw * weights.get(factor) / weight_sum
        } else {
            0.0
        };
        total += weighted;
        breakdown.insert(factor, FactorScore { raw, weighted });
    }

    CrewScore {
        crew_id: crew.id.clone(),
        crew_name: crew.name.clone(),
        total_score: total.clamp(0.0, 1.0),
        committed_hours: inputs.context.committed_hours(&crew.id),
        breakdown,
    }
}

/// Higher total first. Totals within [`SCORE_EPSILON`] of a group's top
/// score tie; ties go to the less loaded crew, then the lower id.
fn rank(results: &mut [CrewScore]) {
    results.sort_by(|a, b| {
        b.total_score
            .total_cmp(&a.total_score)
            .then_with(|| a.crew_id.cmp(&b.crew_id))
    });

    let mut start = 0;
    while start < results.len() {
        let anchor = results[start].total_score;
        let len = results[start..]
            .iter()
            .take_while(|r| anchor - r.total_score <= SCORE_EPSILON)
            .count();
        results[start..start + len].sort_by(tie_break);
        start += len;
    }
}

fn tie_break(a: &CrewScore, b: &CrewScore) -> Ordering {
    a.committed_hours
        .total_cmp(&b.committed_hours)
        .then_with(|| a.crew_id.cmp(&b.crew_id))
}

/// Moves the customer's first choice to the top when override is enabled
/// and that crew survived the eligibility filter.
fn apply_override(context: &ScoringContext, results: &mut Vec<CrewScore>) -> bool {
    if !context.crew_override_enabled {
        return false;
    }
    let Some(first_choice) = context.preferred_crew_ids.first() else {
        return false;
    };
    let Some(position) = results.iter().position(|r| &r.crew_id == first_choice) else {
        return false;
    };

    let mut chosen = results.remove(position);
    chosen.total_score = OVERRIDE_SCORE;
    results.insert(0, chosen);
    true
}
