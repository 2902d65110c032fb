use thiserror::Error;

use shared_api::ApiError;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid slot template: {0}")]
    InvalidTemplate(String),
}

/// Client-side guard rejections. Advisory only; the server remains the
/// authority on booking conflicts.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Slot is already booked")]
    SlotAlreadyBooked,

    #[error("Slot is in the past")]
    PastSlot,
}
