pub mod models;
pub mod services;
pub mod error;

pub use models::*;
pub use error::*;
pub use services::availability::{AvailabilityStore, AvailabilitySnapshot, LoadPhase};
pub use services::recurrence::{expand_weekly_schedule, rolling_week, ROLLING_WINDOW_DAYS};
pub use services::selection::{validate_selected, validate_slot, SelectionState};
