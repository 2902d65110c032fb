use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::NaiveDate;
use std::fmt;

use schedule_cell::SelectedSlot;
use shared_models::{InsuranceSelection, PatientIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Booking record owned by the remote scheduling service. The client holds
/// a transient reference for the duration of the payment step only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time_slot_id: Uuid,
    pub time: String,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance: Option<Uuid>,
}

/// Body for `POST /api/appointments`; always submitted as `pending`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub doctor_id: Uuid,
    pub user_id: Uuid,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time_slot_id: Uuid,
    pub time: String,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<Uuid>,
}

/// Patient record echoed by the scheduling service on creation; carries
/// the device token the confirmation push is addressed to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub push_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentResponse {
    pub appointment: Appointment,
    pub patient: PatientRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubaccountResponse {
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub data: Option<SubaccountData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubaccountData {
    pub subaccount_code: String,
}

/// Everything the orchestrator needs for one booking attempt, gathered
/// from the out-of-scope screens.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub doctor_id: Uuid,
    pub patient: PatientIdentity,
    pub slot: SelectedSlot,
    /// Consultation fee in the clinic's base currency unit.
    pub consultation_fee: f64,
    pub insurance: Option<InsuranceSelection>,
}

/// Terminal state of a booking attempt that did not fail. A cancelled
/// payment is informational, not an error: the pending record stays
/// server-side and the user may retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Confirmed {
        appointment_id: Uuid,
        via_insurance: bool,
        payment_reference: Option<String>,
    },
    PaymentCancelled,
}

/// User-facing feedback raised by the orchestrator, rendered by the host
/// UI as toast/banner chrome.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    BookingConfirmed {
        appointment_id: Uuid,
        patient_name: String,
        date: NaiveDate,
        time: String,
    },
    BookingFailed {
        message: String,
    },
    PaymentCancelled,
}

/// Charge parameters handed to the payment gateway. Amount is in the
/// minor currency unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub email: String,
    pub amount_minor: u64,
    pub subaccount: String,
    pub currency: String,
    pub appointment_id: Uuid,
    pub time_slot_id: Uuid,
}

/// Initialized provider transaction, handed to the checkout widget.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSession {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed { reference: String },
    Cancelled,
}

pub fn to_minor_units(fee: f64) -> u64 {
    (fee * 100.0).round() as u64
}
