use tokio::sync::broadcast;
use tracing::debug;

use crate::models::SlotEvent;

pub type SlotEventReceiver = broadcast::Receiver<SlotEvent>;

/// Broadcast fan-out for slot-change pushes. The socket transport that
/// feeds `publish` lives outside this cell; subscribers are listeners
/// that reconcile local state.
pub struct SlotEventChannel {
    sender: broadcast::Sender<SlotEvent>,
}

impl SlotEventChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    pub fn subscribe(&self) -> SlotEventReceiver {
        self.sender.subscribe()
    }

    /// Best-effort: an event with no listeners attached is dropped.
    pub fn publish(&self, event: SlotEvent) {
        if let Err(e) = self.sender.send(event) {
            debug!("No slot event subscribers attached: {}", e);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SlotEventChannel {
    fn default() -> Self {
        Self::new()
    }
}
