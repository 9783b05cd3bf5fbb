//! Collaborators the booking orchestrator reads from and writes to.

mod memory;

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::models::crew::Crew;
use crate::models::scheduling::SchedulingConfig;
use crate::models::zone::ZoneTravelTime;

pub use memory::InMemoryStore;

const CAPACITY_TOLERANCE: f64 = 1e-9;

/// Committed work per crew on one date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkloadSnapshot {
    pub hours: HashMap<String, f64>,
    pub jobs: HashMap<String, u32>,
}

impl WorkloadSnapshot {
    pub fn add(&mut self, crew_id: &str, hours: f64) {
        *self.hours.entry(crew_id.to_string()).or_insert(0.0) += hours;
        *self.jobs.entry(crew_id.to_string()).or_insert(0) += 1;
    }

    pub fn hours_for(&self, crew_id: &str) -> f64 {
        self.hours.get(crew_id).copied().unwrap_or(0.0)
    }

    pub fn jobs_for(&self, crew_id: &str) -> u32 {
        self.jobs.get(crew_id).copied().unwrap_or(0)
    }

    /// Whether `crew` can take one more job of `hours` on this day.
    pub fn fits(&self, crew: &Crew, hours: f64) -> bool {
        let hours_fit =
            self.hours_for(&crew.id) + hours <= crew.max_hours_per_day + CAPACITY_TOLERANCE;
        let jobs_fit = self.jobs_for(&crew.id).saturating_add(1) <= crew.max_jobs_per_day;
        crew.is_active && hours_fit && jobs_fit
    }
}

pub trait CrewRepository: Send + Sync {
    fn crew(&self, crew_id: &str) -> Option<Crew>;

    fn active_crews(&self, company_id: &str) -> Vec<Crew>;
}

pub trait TravelTimeRepository: Send + Sync {
    fn travel_times(&self, company_id: &str) -> Vec<ZoneTravelTime>;
}

pub trait WorkloadAggregator: Send + Sync {
    /// Hours and job counts of bookings holding crew capacity on `date`.
    fn workloads(&self, company_id: &str, date: NaiveDate) -> WorkloadSnapshot;
}

pub trait SchedulingConfigReader: Send + Sync {
    fn scheduling_config(&self, company_id: &str) -> Option<SchedulingConfig>;
}

pub trait BookingWriter: Send + Sync {
    fn save_booking(&self, booking: Booking);

    /// Stores `booking` for `crew` only if the crew still has capacity on
    /// the booking's date. The check and the insert are atomic per company
    /// and date. Returns false and stores nothing otherwise.
    fn commit_if_fits(&self, booking: Booking, crew: &Crew) -> bool;

    fn booking(&self, booking_id: Uuid) -> Option<Booking>;
}

/// Everything the orchestrator needs from storage.
pub trait BookingStore:
    CrewRepository + TravelTimeRepository + WorkloadAggregator + SchedulingConfigReader + BookingWriter
{
}

impl<T> BookingStore for T where
    T: CrewRepository
        + TravelTimeRepository
        + WorkloadAggregator
        + SchedulingConfigReader
        + BookingWriter
{
}
