use thiserror::Error;

use shared_api::ApiError;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Doctor has no payment subaccount configured")]
    MissingSubaccount,

    #[error("Selected slot is no longer valid")]
    InvalidSlot,

    #[error("Selected slot was already booked")]
    SlotConflict,

    #[error("Appointment creation failed: {0}")]
    BookingCreate(String),

    #[error("Payment initialization failed: {0}")]
    PaymentInit(String),

    /// Payment was captured but the confirmation call failed. Surfaced
    /// with no automatic remediation.
    #[error("Appointment confirmation failed after payment: {0}")]
    Confirmation(String),

    #[error("A booking submission is already in flight")]
    AlreadySubmitting,

    #[error("API error: {0}")]
    Api(#[from] ApiError),
}
