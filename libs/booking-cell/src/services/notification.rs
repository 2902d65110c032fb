use reqwest::Client;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::{Appointment, BookingEvent, PatientRecord};

pub type BookingEventReceiver = broadcast::Receiver<BookingEvent>;

/// Raises user-facing feedback: in-app events on a broadcast channel (the
/// toast/banner fabric) and confirmation pushes through the gateway.
/// Both paths are best-effort; a notification failure never fails a
/// booking that already succeeded.
pub struct NotificationService {
    client: Client,
    push_gateway_url: String,
    events: broadcast::Sender<BookingEvent>,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        let (events, _) = broadcast::channel(100);

        Self {
            client: Client::new(),
            push_gateway_url: config.push_gateway_url.clone(),
            events,
        }
    }

    pub fn subscribe(&self) -> BookingEventReceiver {
        self.events.subscribe()
    }

    pub fn emit(&self, event: BookingEvent) {
        if let Err(e) = self.events.send(event) {
            debug!("No booking event receivers attached: {}", e);
        }
    }

    pub async fn dispatch_push(&self, token: &str, title: &str, body: &str) {
        if self.push_gateway_url.is_empty() {
            debug!("Push gateway not configured, skipping dispatch");
            return;
        }

        let payload = json!({
            "token": token,
            "title": title,
            "body": body,
        });

        let result = self
            .client
            .post(&self.push_gateway_url)
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Push notification dispatched");
            }
            Ok(response) => {
                warn!("Push gateway rejected dispatch: {}", response.status());
            }
            Err(e) => {
                warn!("Push dispatch failed: {}", e);
            }
        }
    }

    /// Confirmation fan-out: one push to the patient's device, one in-app
    /// event for the banner.
    pub async fn announce_confirmation(&self, appointment: &Appointment, patient: &PatientRecord) {
        if let Some(token) = &patient.push_token {
            let body = format!(
                "Your appointment on {} at {} is confirmed.",
                appointment.date, appointment.time
            );
            self.dispatch_push(token, "Appointment confirmed", &body).await;
        } else {
            debug!("Patient {} has no push token registered", patient.id);
        }

        self.emit(BookingEvent::BookingConfirmed {
            appointment_id: appointment.id,
            patient_name: appointment.patient_name.clone(),
            date: appointment.date,
            time: appointment.time.clone(),
        });
    }
}
