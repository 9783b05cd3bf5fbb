use std::collections::HashSet;

use crate::models::crew::{normalize_tag, Crew};
use crate::models::scoring::{Exclusion, ExclusionReason, ScoringContext};
use crate::models::zone::TravelTable;

const CAPACITY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct EligibilityReport<'a> {
    /// Input order preserved.
    pub eligible: Vec<&'a Crew>,
    pub excluded: Vec<Exclusion>,
}

pub fn filter_eligible<'a>(context: &'a ScoringContext, travel: &TravelTable) -> EligibilityReport<'a> {
    let required = required_tags(&context.job_specializations);
    let mut report = EligibilityReport::default();

    for crew in &context.crews {
        match exclusion_reason(crew, context, &required, travel) {
            Some(reason) => report.excluded.push(Exclusion {
                crew_id: crew.id.clone(),
                crew_name: crew.name.clone(),
                reason,
            }),
            None => report.eligible.push(crew),
        }
    }

    report
}

pub(crate) fn required_tags(tags: &[String]) -> HashSet<String> {
    tags.iter()
        .map(|tag| normalize_tag(tag))
        .filter(|tag| !tag.is_empty())
        .collect()
}

fn exclusion_reason(
    crew: &Crew,
    context: &ScoringContext,
    required: &HashSet<String>,
    travel: &TravelTable,
) -> Option<ExclusionReason> {
    if !crew.is_active {
        return Some(ExclusionReason::Inactive);
    }

    if context.zone_enforcement {
        if let (Some(job_zone), Some(crew_zone)) = (&context.job_zone_id, &crew.home_zone_id) {
            if crew_zone != job_zone && travel.between(crew_zone, job_zone).is_none() {
                return Some(ExclusionReason::ZoneUnreachable {
                    crew_zone_id: crew_zone.clone(),
                    job_zone_id: job_zone.clone(),
                });
            }
        }
    }

    if !required.is_empty() && !crew.is_generalist() {
        let covers_any = crew
            .specializations
            .iter()
            .any(|tag| required.contains(&normalize_tag(tag)));
        if !covers_any {
            let mut required: Vec<String> = required.iter().cloned().collect();
            required.sort();
            return Some(ExclusionReason::MissingSpecialization { required });
        }
    }

    let committed_hours = context.committed_hours(&crew.id);
    if committed_hours + context.job_duration > crew.max_hours_per_day + CAPACITY_TOLERANCE {
        return Some(ExclusionReason::HoursExceeded {
            committed_hours,
            requested_hours: context.job_duration,
            max_hours_per_day: crew.max_hours_per_day,
        });
    }

    let booked_jobs = context.committed_jobs(&crew.id);
    if booked_jobs.saturating_add(1) > crew.max_jobs_per_day {
        return Some(ExclusionReason::JobLimitReached {
            booked_jobs,
            max_jobs_per_day: crew.max_jobs_per_day,
        });
    }

    None
}
