use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::scoring::ScoringOutcome;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Assigned,
    /// No crew could take the job; waiting for manual assignment.
    Pending,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub company_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub service_date: NaiveDate,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub zone_id: Option<String>,
    pub duration_hours: f64,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub preferred_crew_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub company_id: String,
    pub customer_id: Option<String>,
    pub service_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub zone_id: Option<String>,
    pub duration_hours: f64,
    pub specializations: Vec<String>,
    pub preferred_crew_ids: Vec<String>,
    pub assigned_crew_id: Option<String>,
    pub assigned_crew_name: Option<String>,
    pub score: Option<f64>,
    pub scoring_explanation: ScoringOutcome,
    /// Why an engine pick was not committed, when that happened.
    #[serde(default)]
    pub assignment_note: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Whether this booking occupies its crew's capacity for the day.
    pub fn holds_capacity(&self) -> bool {
        self.status == BookingStatus::Assigned && self.assigned_crew_id.is_some()
    }
}
