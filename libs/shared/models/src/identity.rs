use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated patient identity, supplied by the session layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
}

/// Doctor reference as consumed from the doctor-detail screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRef {
    pub doctor_id: Uuid,
    pub full_name: String,
}

/// Insurance coverage chosen by the patient before booking, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceSelection {
    pub provider_id: Uuid,
    pub provider_name: String,
}
