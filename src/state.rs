use tokio::sync::broadcast;

use crate::models::booking::Booking;
use crate::observability::metrics::Metrics;
use crate::store::InMemoryStore;

pub struct AppState {
    pub store: InMemoryStore,
    pub booking_events_tx: broadcast::Sender<Booking>,
    pub metrics: Metrics,
    pub commit_attempts: usize,
}

impl AppState {
    pub fn new(event_buffer_size: usize, commit_attempts: usize) -> Self {
        let (booking_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            store: InMemoryStore::new(),
            booking_events_tx,
            metrics: Metrics::new(),
            commit_attempts: commit_attempts.max(1),
        }
    }
}
