use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use dashmap::DashMap;
use uuid::Uuid;

use super::{
    BookingWriter, CrewRepository, SchedulingConfigReader, TravelTimeRepository,
    WorkloadAggregator, WorkloadSnapshot,
};
use crate::models::booking::Booking;
use crate::models::crew::Crew;
use crate::models::scheduling::SchedulingConfig;
use crate::models::zone::ZoneTravelTime;

type ZonePairKey = (String, String, String);
type DayKey = (String, NaiveDate);

#[derive(Default)]
pub struct InMemoryStore {
    pub crews: DashMap<String, Crew>,
    /// Keyed by (company, from zone, to zone).
    pub travel_times: DashMap<ZonePairKey, ZoneTravelTime>,
    pub configs: DashMap<String, SchedulingConfig>,
    pub bookings: DashMap<Uuid, Booking>,
    /// Serializes capacity commits per company and date.
    day_locks: DashMap<DayKey, Arc<Mutex<()>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn day_lock(&self, company_id: &str, date: NaiveDate) -> Arc<Mutex<()>> {
        self.day_locks
            .entry((company_id.to_string(), date))
            .or_default()
            .clone()
    }

    pub fn crews_for(&self, company_id: Option<&str>) -> Vec<Crew> {
        let mut crews: Vec<Crew> = self
            .crews
            .iter()
            .filter(|entry| company_id.is_none_or(|id| entry.company_id == id))
            .map(|entry| entry.value().clone())
            .collect();
        crews.sort_by(|a, b| a.id.cmp(&b.id));
        crews
    }

    /// Inserts or replaces the entry for the ordered zone pair, keeping the
    /// existing id on replace.
    pub fn upsert_travel_time(&self, mut entry: ZoneTravelTime) -> ZoneTravelTime {
        let key = (
            entry.company_id.clone(),
            entry.from_zone_id.clone(),
            entry.to_zone_id.clone(),
        );
        if let Some(existing) = self.travel_times.get(&key) {
            entry.id = existing.id.clone();
        }
        self.travel_times.insert(key, entry.clone());
        entry
    }

    pub fn remove_travel_time(&self, id: &str) -> Option<ZoneTravelTime> {
        let key = self
            .travel_times
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.key().clone())?;
        self.travel_times.remove(&key).map(|(_, entry)| entry)
    }

    pub fn bookings_for(&self, company_id: Option<&str>, date: Option<NaiveDate>) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| company_id.is_none_or(|id| entry.company_id == id))
            .filter(|entry| date.is_none_or(|d| entry.service_date == d))
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        bookings
    }
}

impl CrewRepository for InMemoryStore {
    fn crew(&self, crew_id: &str) -> Option<Crew> {
        self.crews.get(crew_id).map(|entry| entry.value().clone())
    }

    fn active_crews(&self, company_id: &str) -> Vec<Crew> {
        self.crews_for(Some(company_id))
            .into_iter()
            .filter(|crew| crew.is_active)
            .collect()
    }
}

impl TravelTimeRepository for InMemoryStore {
    fn travel_times(&self, company_id: &str) -> Vec<ZoneTravelTime> {
        let mut entries: Vec<ZoneTravelTime> = self
            .travel_times
            .iter()
            .filter(|entry| entry.company_id == company_id)
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by(|a, b| {
            (&a.from_zone_id, &a.to_zone_id).cmp(&(&b.from_zone_id, &b.to_zone_id))
        });
        entries
    }
}

impl WorkloadAggregator for InMemoryStore {
    fn workloads(&self, company_id: &str, date: NaiveDate) -> WorkloadSnapshot {
        let mut snapshot = WorkloadSnapshot::default();

        for entry in self.bookings.iter() {
            let booking = entry.value();
            if booking.company_id != company_id || booking.service_date != date {
                continue;
            }
            if !booking.holds_capacity() {
                continue;
            }
            if let Some(crew_id) = &booking.assigned_crew_id {
                snapshot.add(crew_id, booking.duration_hours);
            }
        }

        snapshot
    }
}

impl SchedulingConfigReader for InMemoryStore {
    fn scheduling_config(&self, company_id: &str) -> Option<SchedulingConfig> {
        self.configs.get(company_id).map(|entry| entry.value().clone())
    }
}

impl BookingWriter for InMemoryStore {
    fn save_booking(&self, booking: Booking) {
        self.bookings.insert(booking.id, booking);
    }

    fn commit_if_fits(&self, booking: Booking, crew: &Crew) -> bool {
        let lock = self.day_lock(&booking.company_id, booking.service_date);
        // The guarded data is (); a poisoned lock is still a valid lock.
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let workload = self.workloads(&booking.company_id, booking.service_date);
        if !workload.fits(crew, booking.duration_hours) {
            return false;
        }

        self.bookings.insert(booking.id, booking);
        true
    }

    fn booking(&self, booking_id: Uuid) -> Option<Booking> {
        self.bookings.get(&booking_id).map(|entry| entry.value().clone())
    }
}
