pub mod models;
pub mod services;

pub use models::SlotEvent;
pub use services::channel::{SlotEventChannel, SlotEventReceiver};
pub use services::listener::{SlotUpdateListener, SubscriptionHandle, DEFAULT_DEBOUNCE};
