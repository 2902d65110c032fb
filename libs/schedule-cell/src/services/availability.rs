// libs/schedule-cell/src/services/availability.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_api::BookingApiClient;

use crate::error::ScheduleError;
use crate::models::{DatedSlotInstance, DayOfWeek, SlotTemplateUpdate, WeeklySlotTemplate};
use crate::services::recurrence::expand_weekly_schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Point-in-time view of the store, cheap to clone out for rendering.
#[derive(Debug, Clone)]
pub struct AvailabilitySnapshot {
    pub schedule: BTreeMap<DayOfWeek, Vec<DatedSlotInstance>>,
    pub phase: LoadPhase,
    pub last_error: Option<String>,
}

/// Per-screen slot state container. The sole shared mutable slot state:
/// written only by `fetch_schedule`/`update_slot`, read by rendering and
/// the selection guard. Collaborators are injected, never ambient.
pub struct AvailabilityStore {
    api: Arc<BookingApiClient>,
    doctor_id: Uuid,
    state: RwLock<AvailabilitySnapshot>,
}

impl AvailabilityStore {
    pub fn new(api: Arc<BookingApiClient>, doctor_id: Uuid) -> Self {
        Self {
            api,
            doctor_id,
            state: RwLock::new(AvailabilitySnapshot {
                schedule: BTreeMap::new(),
                phase: LoadPhase::Idle,
                last_error: None,
            }),
        }
    }

    /// Read the doctor's weekly templates and atomically replace the dated
    /// projection. On failure the previous schedule stays readable; only
    /// the phase and error message change.
    pub async fn fetch_schedule(&self) -> Result<(), ScheduleError> {
        debug!("Fetching weekly schedule for doctor {}", self.doctor_id);

        {
            let mut state = self.state.write().await;
            state.phase = LoadPhase::Loading;
        }

        match self.load_templates().await {
            Ok(templates) => {
                let today = Utc::now().date_naive();
                let schedule = expand_weekly_schedule(&templates, today);

                let mut state = self.state.write().await;
                state.schedule = schedule;
                state.phase = LoadPhase::Ready;
                state.last_error = None;

                info!(
                    "Schedule for doctor {} loaded: {} templates across {} days",
                    self.doctor_id,
                    templates.len(),
                    state.schedule.len()
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Schedule fetch failed for doctor {}, keeping stale schedule: {}",
                    self.doctor_id, e
                );

                let mut state = self.state.write().await;
                state.phase = LoadPhase::Failed;
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Provider-side single-template write. A successful write re-derives
    /// the dated instances via a full refetch; a failed write leaves local
    /// state untouched.
    pub async fn update_slot(
        &self,
        slot_id: Uuid,
        updates: &SlotTemplateUpdate,
    ) -> Result<(), ScheduleError> {
        debug!("Updating slot template {}", slot_id);

        let path = format!("/api/schedule/slot/{}", slot_id);
        let body = serde_json::to_value(updates)
            .map_err(|e| ScheduleError::InvalidTemplate(e.to_string()))?;

        let _: Value = self.api.request(Method::PUT, &path, Some(body)).await?;

        self.fetch_schedule().await
    }

    pub async fn snapshot(&self) -> AvailabilitySnapshot {
        self.state.read().await.clone()
    }

    pub async fn slots_for_day(&self, day: DayOfWeek) -> Vec<DatedSlotInstance> {
        self.state
            .read()
            .await
            .schedule
            .get(&day)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn phase(&self) -> LoadPhase {
        self.state.read().await.phase
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub fn doctor_id(&self) -> Uuid {
        self.doctor_id
    }

    async fn load_templates(&self) -> Result<Vec<WeeklySlotTemplate>, ScheduleError> {
        let path = format!("/api/schedule/{}", self.doctor_id);
        let templates: Vec<WeeklySlotTemplate> =
            self.api.request(Method::GET, &path, None).await?;

        for template in &templates {
            template.validate()?;
        }

        Ok(templates)
    }
}
