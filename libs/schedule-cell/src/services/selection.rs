use chrono::{DateTime, Timelike, Utc};
use tracing::debug;

use crate::error::SelectionError;
use crate::models::{DatedSlotInstance, SelectedSlot};

fn minute_floor(now: DateTime<Utc>) -> chrono::NaiveDateTime {
    let now_naive = now.naive_utc();
    now_naive
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now_naive)
}

/// Client-side selection policy: booked slots and slots whose start has
/// passed are rejected. Comparison is at minute granularity in the clinic
/// reference timezone. Advisory only; the server settles conflicts.
pub fn validate_slot(
    slot: &DatedSlotInstance,
    now: DateTime<Utc>,
) -> Result<(), SelectionError> {
    if slot.is_booked {
        return Err(SelectionError::SlotAlreadyBooked);
    }

    if slot.start_instant() < minute_floor(now) {
        return Err(SelectionError::PastSlot);
    }

    Ok(())
}

/// Same policy re-applied to a held selection at submit time. A slot can
/// go stale between tap and submit; this check never touches the network.
pub fn validate_selected(
    slot: &SelectedSlot,
    now: DateTime<Utc>,
) -> Result<(), SelectionError> {
    if slot.is_booked {
        return Err(SelectionError::SlotAlreadyBooked);
    }

    if slot.start_instant() < minute_floor(now) {
        return Err(SelectionError::PastSlot);
    }

    Ok(())
}

/// Single-selection model: picking a new slot silently replaces the
/// previous one. Cleared on successful booking or navigation away.
#[derive(Debug, Default)]
pub struct SelectionState {
    current: Option<SelectedSlot>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(
        &mut self,
        slot: &DatedSlotInstance,
        now: DateTime<Utc>,
    ) -> Result<SelectedSlot, SelectionError> {
        validate_slot(slot, now)?;

        let selected = SelectedSlot::from_instance(slot);
        debug!("Selected slot {} on {}", selected.id, selected.date);
        self.current = Some(selected.clone());
        Ok(selected)
    }

    pub fn current(&self) -> Option<&SelectedSlot> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
