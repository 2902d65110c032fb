use serde::{Deserialize, Serialize};

/// Server-pushed slot-change signal. The payload is intentionally empty:
/// events only trigger a re-fetch, they never patch local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotEvent {
    SlotUpdated,
}
