pub mod booking;
pub mod eligibility;
pub mod factors;
pub mod scoring;
pub mod strategy;

pub use booking::BookingOrchestrator;
pub use scoring::run_scoring_engine;
