use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use schedule_cell::AvailabilityStore;

use crate::services::channel::SlotEventReceiver;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Scoped subscription to slot pushes. Dropping the handle tears the
/// listener down unconditionally, whatever path the screen exits by.
pub struct SubscriptionHandle {
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }

    /// Explicit teardown; equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Reconciles local slot state against server pushes. Event payloads are
/// never trusted for local mutation; every signal turns into a full
/// re-fetch, with a debounce window coalescing bursts.
pub struct SlotUpdateListener;

impl SlotUpdateListener {
    pub fn subscribe(
        store: Arc<AvailabilityStore>,
        events: SlotEventReceiver,
        debounce: Duration,
    ) -> SubscriptionHandle {
        let task = tokio::spawn(run_loop(store, events, debounce));
        SubscriptionHandle { task }
    }
}

async fn run_loop(
    store: Arc<AvailabilityStore>,
    mut events: SlotEventReceiver,
    debounce: Duration,
) {
    debug!("Slot update listener started for doctor {}", store.doctor_id());

    loop {
        match events.recv().await {
            // A lagged receiver has provably missed updates; treat the
            // overflow itself as a trigger.
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => {
                debug!("Slot event channel closed, stopping listener");
                break;
            }
        }

        tokio::time::sleep(debounce).await;

        let mut closed = false;
        loop {
            match events.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    closed = true;
                    break;
                }
            }
        }

        if let Err(e) = store.fetch_schedule().await {
            warn!("Push-triggered schedule refetch failed: {}", e);
        }

        if closed {
            debug!("Slot event channel closed, stopping listener");
            break;
        }
    }
}
