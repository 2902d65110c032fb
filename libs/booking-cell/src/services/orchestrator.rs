// libs/booking-cell/src/services/orchestrator.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use schedule_cell::{validate_selected, SelectionError};
use shared_api::{ApiError, BookingApiClient};

use crate::error::BookingError;
use crate::models::{
    AppointmentStatus, BookingEvent, BookingOutcome, BookingRequest, CreateAppointmentResponse,
    NewAppointment, PaymentOutcome, PaymentRequest, SubaccountResponse, to_minor_units,
};
use crate::services::notification::NotificationService;
use crate::services::payment::PaymentGateway;

const DEFAULT_CURRENCY: &str = "NGN";

/// Sequences one booking attempt: subaccount lookup, appointment creation,
/// payment, confirmation, notification. Steps run strictly in order; an
/// atomic in-flight flag serializes attempts within this client instance
/// (the server stays the authority on cross-client races).
pub struct BookingService {
    api: Arc<BookingApiClient>,
    payment: Arc<dyn PaymentGateway>,
    notifier: Arc<NotificationService>,
    currency: String,
    is_submitting: AtomicBool,
}

impl BookingService {
    pub fn new(
        api: Arc<BookingApiClient>,
        payment: Arc<dyn PaymentGateway>,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self {
            api,
            payment,
            notifier,
            currency: DEFAULT_CURRENCY.to_string(),
            is_submitting: AtomicBool::new(false),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Run the booking transaction for a selected slot. Failures are
    /// converted to user-facing events before being returned; a cancelled
    /// payment is an outcome, not an error.
    pub async fn execute(&self, request: BookingRequest) -> Result<BookingOutcome, BookingError> {
        if self.is_submitting.swap(true, Ordering::SeqCst) {
            debug!("Booking submission already in flight, ignoring duplicate trigger");
            return Err(BookingError::AlreadySubmitting);
        }

        info!(
            "Starting booking attempt for doctor {} slot {} on {}",
            request.doctor_id, request.slot.id, request.slot.date
        );

        let result = self.run(&request).await;
        self.is_submitting.store(false, Ordering::SeqCst);

        match &result {
            Ok(BookingOutcome::Confirmed { appointment_id, .. }) => {
                info!("Booking attempt finished: appointment {} confirmed", appointment_id);
            }
            Ok(BookingOutcome::PaymentCancelled) => {
                self.notifier.emit(BookingEvent::PaymentCancelled);
            }
            // A swallowed duplicate tap is not user-facing feedback.
            Err(BookingError::AlreadySubmitting) => {}
            Err(e) => {
                self.notifier.emit(BookingEvent::BookingFailed {
                    message: e.to_string(),
                });
            }
        }

        result
    }

    async fn run(&self, request: &BookingRequest) -> Result<BookingOutcome, BookingError> {
        // **Step 1: Submit-time slot freshness re-check (no network)**
        validate_selected(&request.slot, Utc::now()).map_err(|e| match e {
            SelectionError::SlotAlreadyBooked => BookingError::SlotConflict,
            SelectionError::PastSlot => BookingError::InvalidSlot,
        })?;

        // **Step 2: Resolve payment routing (insurance bookings skip it)**
        let subaccount = match request.insurance {
            Some(_) => None,
            None => Some(self.resolve_subaccount(request.doctor_id).await?),
        };

        // **Step 3: Create the pending appointment record**
        let created = self.create_appointment(request).await?;

        // **Step 4: Branch on payment method**
        let Some(subaccount) = subaccount else {
            // Insurance covers the fee: creation is terminal success. The
            // record is still pending server-side when the confirmation is
            // announced.
            warn!(
                "Insurance booking {} announced as confirmed while pending server-side",
                created.appointment.id
            );
            self.notifier
                .announce_confirmation(&created.appointment, &created.patient)
                .await;
            return Ok(BookingOutcome::Confirmed {
                appointment_id: created.appointment.id,
                via_insurance: true,
                payment_reference: None,
            });
        };

        let payment_request = PaymentRequest {
            email: request.patient.email.clone(),
            amount_minor: to_minor_units(request.consultation_fee),
            subaccount,
            currency: self.currency.clone(),
            appointment_id: created.appointment.id,
            time_slot_id: request.slot.id,
        };

        match self.payment.collect_payment(&payment_request).await? {
            PaymentOutcome::Completed { reference } => {
                // **Step 5: Confirm, then notify**
                self.confirm_appointment(created.appointment.id).await?;
                self.notifier
                    .announce_confirmation(&created.appointment, &created.patient)
                    .await;
                Ok(BookingOutcome::Confirmed {
                    appointment_id: created.appointment.id,
                    via_insurance: false,
                    payment_reference: Some(reference),
                })
            }
            PaymentOutcome::Cancelled => {
                warn!(
                    "Payment cancelled by user; appointment {} left pending with no cleanup",
                    created.appointment.id
                );
                Ok(BookingOutcome::PaymentCancelled)
            }
        }
    }

    async fn resolve_subaccount(&self, doctor_id: Uuid) -> Result<String, BookingError> {
        debug!("Resolving payment subaccount for doctor {}", doctor_id);

        let path = format!("/api/subaccount/{}", doctor_id);
        let response: SubaccountResponse = match self.api.request(Method::GET, &path, None).await {
            Ok(response) => response,
            Err(ApiError::Server { status: 404, .. }) => {
                return Err(BookingError::MissingSubaccount)
            }
            Err(e) => return Err(e.into()),
        };

        match response.data {
            Some(data) if response.status && !data.subaccount_code.is_empty() => {
                Ok(data.subaccount_code)
            }
            _ => Err(BookingError::MissingSubaccount),
        }
    }

    async fn create_appointment(
        &self,
        request: &BookingRequest,
    ) -> Result<CreateAppointmentResponse, BookingError> {
        debug!("Creating pending appointment for slot {}", request.slot.id);

        let new_appointment = NewAppointment {
            doctor_id: request.doctor_id,
            user_id: request.patient.user_id,
            patient_name: request.patient.full_name.clone(),
            date: request.slot.date,
            time_slot_id: request.slot.id,
            time: request.slot.time.clone(),
            status: AppointmentStatus::Pending,
            insurance: request.insurance.as_ref().map(|i| i.provider_id),
        };

        let body = serde_json::to_value(&new_appointment)
            .map_err(|e| BookingError::BookingCreate(e.to_string()))?;

        self.api
            .request(Method::POST, "/api/appointments", Some(body))
            .await
            .map_err(|e| BookingError::BookingCreate(e.to_string()))
    }

    async fn confirm_appointment(&self, appointment_id: Uuid) -> Result<(), BookingError> {
        debug!("Confirming appointment {}", appointment_id);

        let path = format!("/api/appointments/confirm/{}", appointment_id);
        let body = json!({ "status": AppointmentStatus::Confirmed });

        let _: serde_json::Value = self
            .api
            .request(Method::PUT, &path, Some(body))
            .await
            .map_err(|e| BookingError::Confirmation(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::payment::MockPaymentGateway;
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, NaiveTime};
    use schedule_cell::SelectedSlot;
    use serde_json::{json, Value};
    use shared_config::AppConfig;
    use shared_models::{InsuranceSelection, PatientIdentity};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_url: &str) -> AppConfig {
        AppConfig {
            booking_api_url: api_url.to_string(),
            booking_api_key: "test-api-key".to_string(),
            paystack_secret_key: "sk_test_abc".to_string(),
            paystack_base_url: "https://api.paystack.co".to_string(),
            push_gateway_url: format!("{}/push/send", api_url),
        }
    }

    fn build_service(
        mock_server: &MockServer,
        gateway: MockPaymentGateway,
    ) -> (BookingService, crate::services::notification::BookingEventReceiver) {
        let config = test_config(&mock_server.uri());
        let api = Arc::new(BookingApiClient::new(&config));
        let notifier = Arc::new(NotificationService::new(&config));
        let events = notifier.subscribe();
        let service = BookingService::new(api, Arc::new(gateway), notifier);
        (service, events)
    }

    fn future_slot(slot_id: Uuid, booked: bool) -> SelectedSlot {
        SelectedSlot {
            id: slot_id,
            date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            time: "09:00 - 10:00".to_string(),
            is_booked: booked,
        }
    }

    fn booking_request(doctor_id: Uuid, slot: SelectedSlot, insured: bool) -> BookingRequest {
        BookingRequest {
            doctor_id,
            patient: PatientIdentity {
                user_id: Uuid::new_v4(),
                email: "ada@example.com".to_string(),
                full_name: "Ada Obi".to_string(),
            },
            slot,
            consultation_fee: 150.0,
            insurance: insured.then(|| InsuranceSelection {
                provider_id: Uuid::new_v4(),
                provider_name: "AXA Mansard".to_string(),
            }),
        }
    }

    fn create_response_json(doctor_id: Uuid, slot_id: Uuid) -> Value {
        json!({
            "appointment": {
                "id": Uuid::new_v4(),
                "doctorId": doctor_id,
                "userId": Uuid::new_v4(),
                "patientName": "Ada Obi",
                "date": "2030-01-07",
                "timeSlotId": slot_id,
                "time": "09:00 - 10:00",
                "status": "pending"
            },
            "patient": {
                "id": Uuid::new_v4(),
                "fullName": "Ada Obi",
                "email": "ada@example.com",
                "pushToken": "device-token-1"
            }
        })
    }

    async fn mount_subaccount(mock_server: &MockServer, doctor_id: Uuid, expect: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/api/subaccount/{}", doctor_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "data": { "subaccount_code": "ACCT_123" }
            })))
            .expect(expect)
            .mount(mock_server)
            .await;
    }

    async fn mount_create(mock_server: &MockServer, doctor_id: Uuid, slot_id: Uuid, expect: u64) {
        Mock::given(method("POST"))
            .and(path("/api/appointments"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(create_response_json(doctor_id, slot_id)),
            )
            .expect(expect)
            .mount(mock_server)
            .await;
    }

    async fn mount_confirm(mock_server: &MockServer, expect: u64) {
        Mock::given(method("PUT"))
            .and(path_regex(r"^/api/appointments/confirm/[0-9a-f-]+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(expect)
            .mount(mock_server)
            .await;
    }

    async fn mount_push(mock_server: &MockServer, expect: u64) {
        Mock::given(method("POST"))
            .and(path("/push/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(expect)
            .mount(mock_server)
            .await;
    }

    #[tokio::test]
    async fn test_insurance_path_skips_subaccount_and_payment() {
        let mock_server = MockServer::start().await;
        let doctor_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();

        mount_subaccount(&mock_server, doctor_id, 0).await;
        mount_create(&mock_server, doctor_id, slot_id, 1).await;
        mount_push(&mock_server, 1).await;

        // No expectations configured: any gateway call panics the test.
        let gateway = MockPaymentGateway::new();
        let (service, mut events) = build_service(&mock_server, gateway);

        let request = booking_request(doctor_id, future_slot(slot_id, false), true);
        let outcome = service.execute(request).await.unwrap();

        assert_matches!(
            outcome,
            BookingOutcome::Confirmed { via_insurance: true, payment_reference: None, .. }
        );
        assert_matches!(events.try_recv(), Ok(BookingEvent::BookingConfirmed { .. }));
    }

    #[tokio::test]
    async fn test_payment_path_sequences_resolve_create_pay_confirm() {
        let mock_server = MockServer::start().await;
        let doctor_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();

        mount_subaccount(&mock_server, doctor_id, 1).await;
        mount_create(&mock_server, doctor_id, slot_id, 1).await;
        mount_confirm(&mock_server, 1).await;
        mount_push(&mock_server, 1).await;

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_collect_payment()
            .withf(|request| {
                request.amount_minor == 15_000
                    && request.subaccount == "ACCT_123"
                    && request.currency == "NGN"
            })
            .times(1)
            .returning(|_| {
                Ok(PaymentOutcome::Completed {
                    reference: "ref-001".to_string(),
                })
            });

        let (service, mut events) = build_service(&mock_server, gateway);
        let request = booking_request(doctor_id, future_slot(slot_id, false), false);
        let outcome = service.execute(request).await.unwrap();

        assert_matches!(
            outcome,
            BookingOutcome::Confirmed { via_insurance: false, payment_reference: Some(ref r), .. }
                if r == "ref-001"
        );
        assert_matches!(events.try_recv(), Ok(BookingEvent::BookingConfirmed { .. }));
    }

    #[tokio::test]
    async fn test_payment_cancel_never_confirms() {
        let mock_server = MockServer::start().await;
        let doctor_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();

        mount_subaccount(&mock_server, doctor_id, 1).await;
        mount_create(&mock_server, doctor_id, slot_id, 1).await;
        mount_confirm(&mock_server, 0).await;

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_collect_payment()
            .times(1)
            .returning(|_| Ok(PaymentOutcome::Cancelled));

        let (service, mut events) = build_service(&mock_server, gateway);
        let request = booking_request(doctor_id, future_slot(slot_id, false), false);
        let outcome = service.execute(request).await.unwrap();

        assert_eq!(outcome, BookingOutcome::PaymentCancelled);
        assert_matches!(events.try_recv(), Ok(BookingEvent::PaymentCancelled));
    }

    #[tokio::test]
    async fn test_reentrant_submission_creates_exactly_once() {
        let mock_server = MockServer::start().await;
        let doctor_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();

        mount_subaccount(&mock_server, doctor_id, 1).await;
        mount_create(&mock_server, doctor_id, slot_id, 1).await;
        mount_confirm(&mock_server, 1).await;
        mount_push(&mock_server, 1).await;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_collect_payment().times(1).returning(|_| {
            Ok(PaymentOutcome::Completed {
                reference: "ref-001".to_string(),
            })
        });

        let (service, _events) = build_service(&mock_server, gateway);
        let first = booking_request(doctor_id, future_slot(slot_id, false), false);
        let second = first.clone();

        let (a, b) = tokio::join!(service.execute(first), service.execute(second));

        let rejected = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(BookingError::AlreadySubmitting)))
            .count();
        assert_eq!(rejected, 1);
        assert!(a.is_ok() || b.is_ok());
    }

    #[tokio::test]
    async fn test_missing_subaccount_aborts_before_creation() {
        let mock_server = MockServer::start().await;
        let doctor_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path(format!("/api/subaccount/{}", doctor_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": false,
                "data": null
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        mount_create(&mock_server, doctor_id, slot_id, 0).await;

        let (service, mut events) = build_service(&mock_server, MockPaymentGateway::new());
        let request = booking_request(doctor_id, future_slot(slot_id, false), false);
        let result = service.execute(request).await;

        assert_matches!(result, Err(BookingError::MissingSubaccount));
        assert_matches!(events.try_recv(), Ok(BookingEvent::BookingFailed { .. }));
    }

    #[tokio::test]
    async fn test_stale_booked_slot_rejected_without_network() {
        let mock_server = MockServer::start().await;
        let doctor_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();

        mount_subaccount(&mock_server, doctor_id, 0).await;
        mount_create(&mock_server, doctor_id, slot_id, 0).await;

        let (service, _events) = build_service(&mock_server, MockPaymentGateway::new());
        let request = booking_request(doctor_id, future_slot(slot_id, true), false);
        let result = service.execute(request).await;

        assert_matches!(result, Err(BookingError::SlotConflict));
    }

    #[tokio::test]
    async fn test_past_slot_rejected_without_network() {
        let mock_server = MockServer::start().await;
        let doctor_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();

        mount_subaccount(&mock_server, doctor_id, 0).await;
        mount_create(&mock_server, doctor_id, slot_id, 0).await;

        let mut slot = future_slot(slot_id, false);
        slot.date = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();

        let (service, _events) = build_service(&mock_server, MockPaymentGateway::new());
        let result = service.execute(booking_request(doctor_id, slot, false)).await;

        assert_matches!(result, Err(BookingError::InvalidSlot));
    }

    #[tokio::test]
    async fn test_create_failure_surfaces_without_payment() {
        let mock_server = MockServer::start().await;
        let doctor_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();

        mount_subaccount(&mock_server, doctor_id, 1).await;
        Mock::given(method("POST"))
            .and(path("/api/appointments"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (service, mut events) = build_service(&mock_server, MockPaymentGateway::new());
        let request = booking_request(doctor_id, future_slot(slot_id, false), false);
        let result = service.execute(request).await;

        assert_matches!(result, Err(BookingError::BookingCreate(_)));
        assert_matches!(events.try_recv(), Ok(BookingEvent::BookingFailed { .. }));
    }

    #[tokio::test]
    async fn test_confirmation_failure_after_payment_is_surfaced() {
        let mock_server = MockServer::start().await;
        let doctor_id = Uuid::new_v4();
        let slot_id = Uuid::new_v4();

        mount_subaccount(&mock_server, doctor_id, 1).await;
        mount_create(&mock_server, doctor_id, slot_id, 1).await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/api/appointments/confirm/[0-9a-f-]+$"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_collect_payment().times(1).returning(|_| {
            Ok(PaymentOutcome::Completed {
                reference: "ref-001".to_string(),
            })
        });

        let (service, mut events) = build_service(&mock_server, gateway);
        let request = booking_request(doctor_id, future_slot(slot_id, false), false);
        let result = service.execute(request).await;

        assert_matches!(result, Err(BookingError::Confirmation(_)));
        assert_matches!(events.try_recv(), Ok(BookingEvent::BookingFailed { .. }));
    }
}
