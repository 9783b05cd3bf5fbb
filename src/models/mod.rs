pub mod booking;
pub mod crew;
pub mod scheduling;
pub mod scoring;
pub mod weights;
pub mod zone;
