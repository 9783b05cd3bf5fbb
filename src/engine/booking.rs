use std::time::Instant;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::scoring::run_scoring_engine;
use crate::error::AppError;
use crate::models::booking::{Booking, BookingRequest, BookingStatus};
use crate::models::crew::Crew;
use crate::models::scheduling::SchedulingConfig;
use crate::models::scoring::{ScoringContext, ScoringOutcome};
use crate::models::zone::ZoneTravelTime;
use crate::observability::metrics::Metrics;
use crate::state::AppState;
use crate::store::{BookingStore, InMemoryStore, WorkloadSnapshot};

/// Turns a booking request into a stored booking, assigning a crew when
/// one can legally take the job.
pub struct BookingOrchestrator<'a, S: BookingStore> {
    store: &'a S,
    metrics: &'a Metrics,
    events: &'a broadcast::Sender<Booking>,
    commit_attempts: usize,
}

impl<'a> BookingOrchestrator<'a, InMemoryStore> {
    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            &state.store,
            &state.metrics,
            &state.booking_events_tx,
            state.commit_attempts,
        )
    }
}

impl<'a, S: BookingStore> BookingOrchestrator<'a, S> {
    pub fn new(
        store: &'a S,
        metrics: &'a Metrics,
        events: &'a broadcast::Sender<Booking>,
        commit_attempts: usize,
    ) -> Self {
        Self {
            store,
            metrics,
            events,
            commit_attempts: commit_attempts.max(1),
        }
    }

    pub fn book(&self, request: BookingRequest) -> Result<Booking, AppError> {
        if let Err(err) = validate_request(&request) {
            self.metrics.bookings_total.with_label_values(&["rejected"]).inc();
            return Err(err);
        }

        let config = self
            .store
            .scheduling_config(&request.company_id)
            .ok_or_else(|| {
                self.metrics.bookings_total.with_label_values(&["rejected"]).inc();
                AppError::ConfigurationMissing(request.company_id.clone())
            })?;

        let booking_id = Uuid::new_v4();
        let mut attempt = 0;
        let (booking, assigned) = loop {
            attempt += 1;

            let crews = self.store.active_crews(&request.company_id);
            let travel_times = self.store.travel_times(&request.company_id);
            let workload = self
                .store
                .workloads(&request.company_id, request.service_date);
            let context = build_context(&request, &config, &crews, &travel_times, &workload);
            let outcome = self.score(&context)?;

            let Some(winner_id) = outcome.winner().map(|winner| winner.crew_id.clone()) else {
                let booking = self.to_booking(booking_id, &request, outcome, None);
                self.store.save_booking(booking.clone());
                break (booking, None);
            };

            if let Some(crew) = self.store.crew(&winner_id) {
                let booking = self.to_booking(booking_id, &request, outcome.clone(), Some(&crew));
                if self.store.commit_if_fits(booking.clone(), &crew) {
                    break (booking, Some(crew));
                }
            }

            warn!(
                company_id = %request.company_id,
                crew_id = %winner_id,
                attempt,
                "winning crew lost capacity before commit"
            );
            if attempt >= self.commit_attempts {
                let mut outcome = outcome;
                outcome.winner_id = None;
                outcome.winner_name = None;

                let mut booking = self.to_booking(booking_id, &request, outcome, None);
                booking.assignment_note = Some(format!(
                    "crew {winner_id} lost capacity before commit; gave up after {attempt} attempts"
                ));
                self.store.save_booking(booking.clone());
                break (booking, None);
            }
        };

        for exclusion in &booking.scoring_explanation.excluded {
            self.metrics
                .crew_exclusions_total
                .with_label_values(&[exclusion.reason.key()])
                .inc();
        }

        match &assigned {
            Some(crew) => {
                self.metrics.bookings_total.with_label_values(&["assigned"]).inc();
                self.record_utilization(&booking, crew);
                info!(
                    booking_id = %booking.id,
                    company_id = %booking.company_id,
                    crew_id = %crew.id,
                    score = booking.score.unwrap_or_default(),
                    override_applied = booking.scoring_explanation.override_applied,
                    "booking assigned"
                );
            }
            None => {
                self.metrics.bookings_total.with_label_values(&["pending"]).inc();
                info!(
                    booking_id = %booking.id,
                    company_id = %booking.company_id,
                    excluded = booking.scoring_explanation.excluded.len(),
                    "no crew available; booking pending manual assignment"
                );
            }
        }

        let _ = self.events.send(booking.clone());
        Ok(booking)
    }

    pub fn cancel(&self, booking_id: Uuid) -> Result<Booking, AppError> {
        let mut booking = self
            .store
            .booking(booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::Conflict(format!(
                "booking {booking_id} is already cancelled"
            )));
        }

        booking.status = BookingStatus::Cancelled;
        booking.updated_at = Utc::now();
        self.store.save_booking(booking.clone());

        info!(booking_id = %booking.id, "booking cancelled");
        let _ = self.events.send(booking.clone());
        Ok(booking)
    }

    /// Dispatcher fallback for bookings the engine could not place.
    pub fn assign_manually(&self, booking_id: Uuid, crew_id: &str) -> Result<Booking, AppError> {
        let mut booking = self
            .store
            .booking(booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;

        if booking.status != BookingStatus::Pending {
            return Err(AppError::Conflict(format!(
                "booking {booking_id} is not pending"
            )));
        }

        let crew = self
            .store
            .crew(crew_id)
            .filter(|crew| crew.company_id == booking.company_id)
            .ok_or_else(|| AppError::NotFound(format!("crew {crew_id} not found")))?;

        if !crew.is_active {
            return Err(AppError::Conflict(format!("crew {crew_id} is inactive")));
        }

        booking.status = BookingStatus::Assigned;
        booking.assigned_crew_id = Some(crew.id.clone());
        booking.assigned_crew_name = Some(crew.name.clone());
        booking.score = None;
        booking.updated_at = Utc::now();
        self.store.save_booking(booking.clone());
        self.record_utilization(&booking, &crew);

        info!(booking_id = %booking.id, crew_id = %crew.id, "booking assigned manually");
        let _ = self.events.send(booking.clone());
        Ok(booking)
    }

    fn score(&self, context: &ScoringContext) -> Result<ScoringOutcome, AppError> {
        let started = Instant::now();
        let result = run_scoring_engine(context);
        let label = if result.is_ok() { "success" } else { "error" };

        self.metrics
            .scoring_latency_seconds
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result.map_err(|err| {
            self.metrics.bookings_total.with_label_values(&["rejected"]).inc();
            AppError::from(err)
        })
    }

    fn record_utilization(&self, booking: &Booking, crew: &Crew) {
        if crew.max_hours_per_day <= 0.0 {
            return;
        }
        let committed = self
            .store
            .workloads(&booking.company_id, booking.service_date)
            .hours_for(&crew.id);

        self.metrics
            .crew_utilization
            .with_label_values(&[&crew.id])
            .set((committed / crew.max_hours_per_day).clamp(0.0, 1.0));
    }

    fn to_booking(
        &self,
        id: Uuid,
        request: &BookingRequest,
        outcome: ScoringOutcome,
        assigned: Option<&Crew>,
    ) -> Booking {
        let now = Utc::now();
        let score = assigned.and_then(|crew| {
            outcome
                .results
                .iter()
                .find(|result| result.crew_id == crew.id)
                .map(|result| result.total_score)
        });

        Booking {
            id,
            company_id: request.company_id.clone(),
            customer_id: request.customer_id.clone(),
            service_date: request.service_date,
            start_time: request.start_time,
            zone_id: request.zone_id.clone(),
            duration_hours: request.duration_hours,
            specializations: request.specializations.clone(),
            preferred_crew_ids: request.preferred_crew_ids.clone(),
            assigned_crew_id: assigned.map(|crew| crew.id.clone()),
            assigned_crew_name: assigned.map(|crew| crew.name.clone()),
            score,
            scoring_explanation: outcome,
            assignment_note: None,
            status: if assigned.is_some() {
                BookingStatus::Assigned
            } else {
                BookingStatus::Pending
            },
            created_at: now,
            updated_at: now,
        }
    }
}

fn validate_request(request: &BookingRequest) -> Result<(), AppError> {
    if request.company_id.trim().is_empty() {
        return Err(AppError::BadRequest("companyId cannot be empty".to_string()));
    }
    if !request.duration_hours.is_finite() || request.duration_hours <= 0.0 {
        return Err(AppError::BadRequest(
            "durationHours must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub fn build_context(
    request: &BookingRequest,
    config: &SchedulingConfig,
    crews: &[Crew],
    travel_times: &[ZoneTravelTime],
    workload: &WorkloadSnapshot,
) -> ScoringContext {
    ScoringContext {
        crews: crews.to_vec(),
        weights: config.weights,
        mode: config.mode,
        crew_override_enabled: config.crew_override_enabled,
        zone_enforcement: config.zone_enforcement,
        preferred_crew_ids: request.preferred_crew_ids.clone(),
        job_zone_id: request.zone_id.clone(),
        job_duration: request.duration_hours,
        job_specializations: request.specializations.clone(),
        crew_workloads: workload.hours.clone(),
        crew_job_counts: workload.jobs.clone(),
        travel_times: travel_times.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, Mutex};
    use std::thread;

    use chrono::NaiveDate;
    use tokio::sync::broadcast;
    use uuid::Uuid;

    use super::BookingOrchestrator;
    use crate::error::AppError;
    use crate::models::booking::{Booking, BookingRequest, BookingStatus};
    use crate::models::crew::Crew;
    use crate::models::scheduling::SchedulingConfig;
    use crate::models::scoring::PriorityMode;
    use crate::models::weights::PriorityWeights;
    use crate::models::zone::ZoneTravelTime;
    use crate::observability::metrics::Metrics;
    use crate::store::{
        BookingWriter, CrewRepository, InMemoryStore, SchedulingConfigReader,
        TravelTimeRepository, WorkloadAggregator, WorkloadSnapshot,
    };

    /// Loses the next `steals` commits to a rival booking that fills the
    /// winning crew's day.
    struct ContendedStore {
        inner: InMemoryStore,
        steals: AtomicUsize,
        rival_hours: Mutex<HashMap<String, f64>>,
    }

    impl ContendedStore {
        fn new(inner: InMemoryStore, steals: usize) -> Self {
            Self {
                inner,
                steals: AtomicUsize::new(steals),
                rival_hours: Mutex::new(HashMap::new()),
            }
        }
    }

    impl CrewRepository for ContendedStore {
        fn crew(&self, crew_id: &str) -> Option<Crew> {
            self.inner.crew(crew_id)
        }

        fn active_crews(&self, company_id: &str) -> Vec<Crew> {
            self.inner.active_crews(company_id)
        }
    }

    impl TravelTimeRepository for ContendedStore {
        fn travel_times(&self, company_id: &str) -> Vec<ZoneTravelTime> {
            self.inner.travel_times(company_id)
        }
    }

    impl WorkloadAggregator for ContendedStore {
        fn workloads(&self, company_id: &str, date: NaiveDate) -> WorkloadSnapshot {
            let mut snapshot = self.inner.workloads(company_id, date);
            for (crew_id, hours) in self.rival_hours.lock().unwrap().iter() {
                snapshot.add(crew_id, *hours);
            }
            snapshot
        }
    }

    impl SchedulingConfigReader for ContendedStore {
        fn scheduling_config(&self, company_id: &str) -> Option<SchedulingConfig> {
            self.inner.scheduling_config(company_id)
        }
    }

    impl BookingWriter for ContendedStore {
        fn save_booking(&self, booking: Booking) {
            self.inner.save_booking(booking);
        }

        fn commit_if_fits(&self, booking: Booking, crew: &Crew) -> bool {
            let stolen = self
                .steals
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if stolen {
                self.rival_hours
                    .lock()
                    .unwrap()
                    .insert(crew.id.clone(), crew.max_hours_per_day);
                return false;
            }
            self.inner.commit_if_fits(booking, crew)
        }

        fn booking(&self, booking_id: Uuid) -> Option<Booking> {
            self.inner.booking(booking_id)
        }
    }

    fn crew(id: &str, max_hours: f64) -> Crew {
        Crew {
            id: id.to_string(),
            company_id: "acme".to_string(),
            name: format!("Crew {id}"),
            color: None,
            home_zone_id: Some("z1".to_string()),
            specializations: vec!["hvac".to_string()],
            max_hours_per_day: max_hours,
            max_jobs_per_day: 3,
            is_active: true,
        }
    }

    fn config() -> SchedulingConfig {
        SchedulingConfig {
            weights: PriorityWeights::default(),
            mode: PriorityMode::Balanced,
            crew_override_enabled: false,
            zone_enforcement: false,
        }
    }

    fn request(hours: f64) -> BookingRequest {
        BookingRequest {
            company_id: "acme".to_string(),
            customer_id: Some("cust-1".to_string()),
            service_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            start_time: None,
            zone_id: Some("z1".to_string()),
            duration_hours: hours,
            specializations: vec!["hvac".to_string()],
            preferred_crew_ids: Vec::new(),
        }
    }

    fn store_with(crews: Vec<Crew>) -> InMemoryStore {
        let store = InMemoryStore::new();
        for crew in crews {
            store.crews.insert(crew.id.clone(), crew);
        }
        store.configs.insert("acme".to_string(), config());
        store
    }

    #[test]
    fn missing_configuration_fails_the_booking() {
        let store = InMemoryStore::new();
        store.crews.insert("a".to_string(), crew("a", 8.0));
        let metrics = Metrics::new();
        let (tx, _rx) = broadcast::channel(8);
        let orchestrator = BookingOrchestrator::new(&store, &metrics, &tx, 3);

        let err = orchestrator.book(request(1.0)).unwrap_err();
        assert!(matches!(err, AppError::ConfigurationMissing(company) if company == "acme"));
        assert!(store.bookings.is_empty());
    }

    #[test]
    fn bookings_accumulate_workload_until_pending() {
        let store = store_with(vec![crew("a", 4.0)]);
        let metrics = Metrics::new();
        let (tx, _rx) = broadcast::channel(8);
        let orchestrator = BookingOrchestrator::new(&store, &metrics, &tx, 3);

        let first = orchestrator.book(request(3.0)).unwrap();
        assert_eq!(first.status, BookingStatus::Assigned);
        assert_eq!(first.assigned_crew_id.as_deref(), Some("a"));
        assert!(first.score.is_some());

        let second = orchestrator.book(request(2.0)).unwrap();
        assert_eq!(second.status, BookingStatus::Pending);
        assert!(second.assigned_crew_id.is_none());
        assert!(second.scoring_explanation.results.is_empty());
        assert_eq!(second.scoring_explanation.excluded.len(), 1);

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(store.workloads("acme", date).hours_for("a"), 3.0);
    }

    #[test]
    fn cancelling_frees_capacity() {
        let store = store_with(vec![crew("a", 4.0)]);
        let metrics = Metrics::new();
        let (tx, _rx) = broadcast::channel(8);
        let orchestrator = BookingOrchestrator::new(&store, &metrics, &tx, 3);

        let first = orchestrator.book(request(4.0)).unwrap();
        orchestrator.cancel(first.id).unwrap();
        assert!(matches!(
            orchestrator.cancel(first.id),
            Err(AppError::Conflict(_))
        ));

        let again = orchestrator.book(request(4.0)).unwrap();
        assert_eq!(again.status, BookingStatus::Assigned);
    }

    #[test]
    fn pending_booking_can_be_assigned_manually() {
        let store = store_with(vec![crew("a", 2.0)]);
        let metrics = Metrics::new();
        let (tx, mut rx) = broadcast::channel(8);
        let orchestrator = BookingOrchestrator::new(&store, &metrics, &tx, 3);

        let pending = orchestrator.book(request(5.0)).unwrap();
        assert_eq!(pending.status, BookingStatus::Pending);

        let assigned = orchestrator.assign_manually(pending.id, "a").unwrap();
        assert_eq!(assigned.status, BookingStatus::Assigned);
        assert_eq!(assigned.assigned_crew_name.as_deref(), Some("Crew a"));
        assert!(assigned.score.is_none());

        assert!(matches!(
            orchestrator.assign_manually(pending.id, "a"),
            Err(AppError::Conflict(_))
        ));

        assert_eq!(rx.try_recv().unwrap().status, BookingStatus::Pending);
        assert_eq!(rx.try_recv().unwrap().status, BookingStatus::Assigned);
    }

    #[test]
    fn invalid_duration_is_rejected_before_scoring() {
        let store = store_with(vec![crew("a", 8.0)]);
        let metrics = Metrics::new();
        let (tx, _rx) = broadcast::channel(8);
        let orchestrator = BookingOrchestrator::new(&store, &metrics, &tx, 3);

        assert!(matches!(
            orchestrator.book(request(0.0)),
            Err(AppError::BadRequest(_))
        ));
        assert!(store.bookings.is_empty());
    }

    #[test]
    fn lost_commit_rescores_and_takes_the_runner_up() {
        let store = ContendedStore::new(store_with(vec![crew("a", 4.0), crew("b", 4.0)]), 1);
        let metrics = Metrics::new();
        let (tx, _rx) = broadcast::channel(8);
        let orchestrator = BookingOrchestrator::new(&store, &metrics, &tx, 3);

        let booking = orchestrator.book(request(2.0)).unwrap();

        assert_eq!(booking.status, BookingStatus::Assigned);
        assert_eq!(booking.assigned_crew_id.as_deref(), Some("b"));
        assert_eq!(booking.scoring_explanation.winner_id.as_deref(), Some("b"));
        assert_eq!(booking.scoring_explanation.excluded[0].crew_id, "a");
        assert!(booking.assignment_note.is_none());
        assert_eq!(store.inner.bookings.len(), 1);
    }

    #[test]
    fn exhausted_commit_attempts_leave_the_booking_pending() {
        let store = ContendedStore::new(store_with(vec![crew("a", 4.0), crew("b", 4.0)]), 2);
        let metrics = Metrics::new();
        let (tx, mut rx) = broadcast::channel(8);
        let orchestrator = BookingOrchestrator::new(&store, &metrics, &tx, 2);

        let booking = orchestrator.book(request(2.0)).unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(booking.assigned_crew_id.is_none());
        assert!(booking.score.is_none());
        assert!(booking.scoring_explanation.winner_id.is_none());
        assert!(booking.scoring_explanation.winner_name.is_none());
        assert_eq!(booking.scoring_explanation.results[0].crew_id, "b");
        let note = booking.assignment_note.as_deref().unwrap();
        assert!(note.contains("crew b"), "{note}");
        assert!(note.contains("2 attempts"), "{note}");

        let stored = store.inner.bookings.get(&booking.id).unwrap().clone();
        assert_eq!(stored.status, BookingStatus::Pending);
        assert_eq!(rx.try_recv().unwrap().id, booking.id);
    }

    #[test]
    fn concurrent_bookings_never_overbook_a_crew() {
        const THREADS: usize = 8;

        for _ in 0..25 {
            let mut single = crew("a", 2.0);
            single.max_jobs_per_day = 1;
            let store = store_with(vec![single]);
            let metrics = Metrics::new();
            let (tx, _rx) = broadcast::channel(THREADS * 2);
            let orchestrator = BookingOrchestrator::new(&store, &metrics, &tx, 3);
            let barrier = Barrier::new(THREADS);

            let bookings: Vec<Booking> = thread::scope(|scope| {
                let handles: Vec<_> = (0..THREADS)
                    .map(|_| {
                        scope.spawn(|| {
                            barrier.wait();
                            orchestrator.book(request(2.0)).unwrap()
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let assigned = bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Assigned)
                .count();
            assert_eq!(assigned, 1);

            let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
            let workload = store.workloads("acme", date);
            assert_eq!(workload.jobs_for("a"), 1);
            assert_eq!(workload.hours_for("a"), 2.0);
        }
    }
}
