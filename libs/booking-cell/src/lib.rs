pub mod models;
pub mod services;
pub mod error;

pub use models::*;
pub use error::*;
pub use services::notification::NotificationService;
pub use services::orchestrator::BookingService;
pub use services::payment::{PaymentGateway, PaymentPrompt, PaystackClient, PaystackGateway};
