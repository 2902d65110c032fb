// libs/booking-cell/src/services/payment.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::error::BookingError;
use crate::models::{PaymentOutcome, PaymentRequest, PaymentSession};

/// Seam between the orchestrator and the payment provider. The production
/// implementation initializes a provider transaction and defers the
/// outcome to the checkout widget; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn collect_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentOutcome, BookingError>;
}

/// Host-UI collaborator that presents the provider checkout for an
/// initialized transaction and resolves with the user's outcome.
#[async_trait]
pub trait PaymentPrompt: Send + Sync {
    async fn await_outcome(&self, session: &PaymentSession) -> PaymentOutcome;
}

#[derive(Debug, Deserialize)]
struct PaystackInitResponse {
    status: bool,
    message: String,
    data: Option<PaymentSession>,
}

/// Paystack transaction-initialize client.
/// Based on: https://paystack.com/docs/api/transaction/#initialize
pub struct PaystackClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl PaystackClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            secret_key: config.paystack_secret_key.clone(),
            base_url: config.paystack_base_url.clone(),
        }
    }

    /// POST /transaction/initialize
    ///
    /// The transaction metadata carries the appointment and slot ids so
    /// provider-side records can be reconciled against the booking.
    pub async fn initialize_transaction(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentSession, BookingError> {
        info!(
            "Initializing payment of {} {} for appointment {}",
            request.amount_minor, request.currency, request.appointment_id
        );

        let url = format!("{}/transaction/initialize", self.base_url);

        let body = json!({
            "email": request.email,
            "amount": request.amount_minor,
            "subaccount": request.subaccount,
            "currency": request.currency,
            "metadata": {
                "appointmentId": request.appointment_id,
                "timeSlotId": request.time_slot_id,
            }
        });

        debug!("Sending transaction initialize request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BookingError::PaymentInit(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| BookingError::PaymentInit(e.to_string()))?;

        if !status.is_success() {
            error!("Transaction initialize failed: {} - {}", status, response_text);
            return Err(BookingError::PaymentInit(format!(
                "HTTP {}: {}",
                status, response_text
            )));
        }

        let init_response: PaystackInitResponse = serde_json::from_str(&response_text)
            .map_err(|e| {
                BookingError::PaymentInit(format!("Failed to parse initialize response: {}", e))
            })?;

        if !init_response.status {
            return Err(BookingError::PaymentInit(init_response.message));
        }

        let session = init_response.data.ok_or_else(|| {
            BookingError::PaymentInit("Initialize response carried no transaction data".to_string())
        })?;

        info!("Payment session initialized with reference {}", session.reference);
        Ok(session)
    }
}

/// Production gateway: initialize with Paystack, then hand the session to
/// the checkout widget and wait for the user's outcome.
pub struct PaystackGateway {
    client: PaystackClient,
    prompt: Arc<dyn PaymentPrompt>,
}

impl PaystackGateway {
    pub fn new(config: &AppConfig, prompt: Arc<dyn PaymentPrompt>) -> Self {
        Self {
            client: PaystackClient::new(config),
            prompt,
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn collect_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentOutcome, BookingError> {
        let session = self.client.initialize_transaction(request).await?;
        Ok(self.prompt.await_outcome(&session).await)
    }
}
