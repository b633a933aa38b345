use anyhow::Result;
use serde::Serialize;

use crate::models::PredictResponse;

/// What a form user sees after submitting a prediction request.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientOutcome {
    Prediction(String),
    ApiError(u16),
    ServerUnreachable,
}

impl ClientOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ClientOutcome::Prediction(_))
    }

    pub fn display_text(&self) -> String {
        match self {
            ClientOutcome::Prediction(message) => format!("Acne Risk Prediction: {}", message),
            ClientOutcome::ApiError(status) => format!("API Error: {}", status),
            ClientOutcome::ServerUnreachable => "Server Error!".to_string(),
        }
    }
}

/// Thin client for the `/predict` endpoint.
pub struct PredictClient {
    url: String,
    client: reqwest::Client,
}

impl PredictClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post `body` verbatim as JSON. Non-2xx statuses and connection failures
    /// are outcomes, not errors; only unexpected failures return `Err`.
    pub async fn predict<T: Serialize + ?Sized>(&self, body: &T) -> Result<ClientOutcome> {
        log::debug!("📤 POST {}", self.url);

        let response = match self.client.post(&self.url).json(body).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                log::warn!("⚠️ Prediction API unreachable at {}: {}", self.url, e);
                return Ok(ClientOutcome::ServerUnreachable);
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status().as_u16();
        if status == 200 || status == 201 {
            let result: PredictResponse = response.json().await?;
            log::debug!("📥 Prediction received: {}", result.message);
            Ok(ClientOutcome::Prediction(result.message))
        } else {
            log::warn!("⚠️ Prediction API returned HTTP {}", status);
            Ok(ClientOutcome::ApiError(status))
        }
    }
}
