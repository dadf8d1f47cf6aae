//! Reqwest-backed adapter for the model services.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::contracts::{FraudReport, FraudRequest, PriorityPrediction, PriorityRequest};
use crate::config::ScoringConfig;

/// Port to the priority and fraud models.
#[async_trait]
pub trait ScoringClient: Send + Sync {
    async fn predict_priority(
        &self,
        request: &PriorityRequest,
    ) -> Result<PriorityPrediction, ScoringError>;

    async fn detect_fraud(&self, request: &FraudRequest) -> Result<FraudReport, ScoringError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("{service} service unreachable: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },
    #[error("{service} service answered {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} service returned an unreadable payload: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
    #[error("fraud service returned no result for farmer {farmer_id}")]
    MissingResult { farmer_id: String },
}

const PRIORITY: &str = "priority";
const FRAUD: &str = "fraud";

/// Longest error body excerpt kept for logs.
const BODY_EXCERPT: usize = 512;

/// HTTP client posting JSON to the two model services.
pub struct HttpScoringClient {
    client: Client,
    priority_url: String,
    fraud_url: String,
}

impl HttpScoringClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: &ScoringConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            priority_url: config.priority_url.trim_end_matches('/').to_string(),
            fraud_url: config.fraud_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<B, T>(
        &self,
        service: &'static str,
        url: String,
        body: &B,
    ) -> Result<T, ScoringError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|error| map_transport_error(service, error))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|error| map_transport_error(service, error))?;
        if !status.is_success() {
            return Err(map_status_error(service, status, bytes.as_ref()));
        }

        serde_json::from_slice(bytes.as_ref()).map_err(|error| ScoringError::Decode {
            service,
            message: error.to_string(),
        })
    }
}

fn map_transport_error(service: &'static str, error: reqwest::Error) -> ScoringError {
    let message = if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    };
    ScoringError::Transport { service, message }
}

fn map_status_error(service: &'static str, status: StatusCode, body: &[u8]) -> ScoringError {
    let text = String::from_utf8_lossy(body);
    let body: String = text.chars().take(BODY_EXCERPT).collect();
    ScoringError::Status {
        service,
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl ScoringClient for HttpScoringClient {
    async fn predict_priority(
        &self,
        request: &PriorityRequest,
    ) -> Result<PriorityPrediction, ScoringError> {
        let url = format!("{}/predict", self.priority_url);
        self.post_json(PRIORITY, url, request).await
    }

    async fn detect_fraud(&self, request: &FraudRequest) -> Result<FraudReport, ScoringError> {
        let url = format!("{}/detect", self.fraud_url);
        self.post_json(FRAUD, url, request).await
    }
}
