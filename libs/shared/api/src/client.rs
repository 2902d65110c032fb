use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::ApiError;

/// Thin HTTP client for the remote scheduling service.
///
/// All cells share one instance; it owns the base URL and api-key header
/// and maps non-2xx responses and undecodable bodies to typed errors.
pub struct BookingApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl BookingApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.booking_api_url.clone(),
            api_key: config.booking_api_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(value) = HeaderValue::from_str(&self.api_key) {
            headers.insert("x-api-key", value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(ApiError::Server {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let raw = response.text().await?;
        serde_json::from_str::<T>(&raw).map_err(|e| {
            error!("Failed to decode response from {}: {}", url, e);
            ApiError::MalformedResponse(e.to_string())
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
