pub mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::warn;

use models::{ChatRequest, ChatResponse, FeedbackRequest, OrchestratorSettings};

/// Generation latency can run into minutes, so the bound is deliberately
/// generous and applied to every call alike.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Orchestrator Error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Invalid Response: {0}")]
    InvalidResponse(String),
}

/// The orchestrator operations the session controllers consume. One attempt
/// per call; retry policy, if any, belongs to the caller's transport, not here.
#[async_trait]
pub trait OrchestratorApi: Send + Sync {
    async fn chat(&self, endpoint: &str, request: &ChatRequest) -> Result<ChatResponse, ApiError>;

    async fn feedback(&self, endpoint: &str, request: &FeedbackRequest) -> Result<(), ApiError>;

    /// Settings are optional on the wire: any failure falls back to defaults.
    async fn fetch_settings(&self, endpoint: &str) -> OrchestratorSettings;

    async fn health(&self, endpoint: &str) -> bool;
}

pub struct HttpOrchestrator {
    client: Client,
}

impl HttpOrchestrator {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl OrchestratorApi for HttpOrchestrator {
    async fn chat(&self, endpoint: &str, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        let response = self
            .client
            .post(format!("{}/chat", endpoint))
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api { status, body });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn feedback(&self, endpoint: &str, request: &FeedbackRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/feedback", endpoint))
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api { status, body });
        }

        Ok(())
    }

    async fn fetch_settings(&self, endpoint: &str) -> OrchestratorSettings {
        let result = self
            .client
            .get(format!("{}/config", endpoint))
            .send()
            .await;

        let response = match result {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!("config endpoint returned {}, using defaults", r.status());
                return OrchestratorSettings::default();
            }
            Err(e) => {
                warn!("config endpoint unreachable ({}), using defaults", e);
                return OrchestratorSettings::default();
            }
        };

        match response.json::<OrchestratorSettings>().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("config payload unreadable ({}), using defaults", e);
                OrchestratorSettings::default()
            }
        }
    }

    async fn health(&self, endpoint: &str) -> bool {
        match self.client.get(format!("{}/health", endpoint)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
