use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub booking_api_url: String,
    pub booking_api_key: String,
    pub paystack_secret_key: String,
    pub paystack_base_url: String,
    pub push_gateway_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            booking_api_url: env::var("BOOKING_API_URL")
                .unwrap_or_else(|_| {
                    warn!("BOOKING_API_URL not set, using empty value");
                    String::new()
                }),
            booking_api_key: env::var("BOOKING_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("BOOKING_API_KEY not set, using empty value");
                    String::new()
                }),
            paystack_secret_key: env::var("PAYSTACK_SECRET_KEY")
                .unwrap_or_else(|_| {
                    warn!("PAYSTACK_SECRET_KEY not set, using empty value");
                    String::new()
                }),
            paystack_base_url: env::var("PAYSTACK_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("PAYSTACK_BASE_URL not set, using default");
                    "https://api.paystack.co".to_string()
                }),
            push_gateway_url: env::var("PUSH_GATEWAY_URL")
                .unwrap_or_else(|_| {
                    warn!("PUSH_GATEWAY_URL not set, using empty value");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.booking_api_url.is_empty()
            && !self.booking_api_key.is_empty()
    }

    pub fn is_payments_configured(&self) -> bool {
        !self.paystack_secret_key.is_empty()
            && !self.paystack_base_url.is_empty()
    }

    pub fn is_push_configured(&self) -> bool {
        !self.push_gateway_url.is_empty()
    }
}
