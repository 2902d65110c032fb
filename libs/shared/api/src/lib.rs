pub mod client;
pub mod error;

pub use client::BookingApiClient;
pub use error::ApiError;
