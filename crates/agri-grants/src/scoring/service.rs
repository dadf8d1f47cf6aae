use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::client::{ScoringClient, ScoringError};
use super::contracts::{
    FraudAssessment, FraudCandidate, FraudRequest, PriorityPrediction, PriorityRequest,
};
use crate::error::{Categorized, ErrorCategory};
use crate::workflows::grants::applications::{
    Application, ApplicationId, ApplicationRepository, ApplicationReviewService,
    ApplicationServiceError, ApplicationView,
};
use crate::workflows::grants::repository::GrantRepository;

/// Result of scoring one application with the priority model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredApplication {
    pub application: Application,
    pub prediction: PriorityPrediction,
}

/// A model result, or why it could not be obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelOutcome<T> {
    Available { result: T },
    Unavailable { reason: String },
}

impl<T> ModelOutcome<T> {
    fn from_result(model: &'static str, result: Result<T, ScoringError>) -> Self {
        match result {
            Ok(result) => ModelOutcome::Available { result },
            Err(error) => {
                warn!(model, error = %error, "model result unavailable");
                ModelOutcome::Unavailable {
                    reason: error.to_string(),
                }
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ModelOutcome::Available { .. })
    }
}

/// Application detail enriched with both model opinions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationInsights {
    pub application: ApplicationView,
    pub priority: ModelOutcome<PriorityPrediction>,
    pub fraud: ModelOutcome<FraudAssessment>,
}

/// Bridges stored applications and the external model services.
pub struct ScoringService<S, C> {
    review: Arc<ApplicationReviewService<S>>,
    client: Arc<C>,
}

impl<S, C> ScoringService<S, C>
where
    S: GrantRepository + ApplicationRepository + 'static,
    C: ScoringClient + 'static,
{
    pub fn new(review: Arc<ApplicationReviewService<S>>, client: Arc<C>) -> Self {
        Self { review, client }
    }

    /// Ask the priority model and store its score on the application.
    pub async fn score(
        &self,
        application_id: ApplicationId,
    ) -> Result<ScoredApplication, ScoringServiceError> {
        let view = self.review.get(application_id)?;
        let request = PriorityRequest::for_application(&view.application);
        let prediction = self.client.predict_priority(&request).await?;

        let application = self
            .review
            .attach_ai_score(application_id, prediction.priority_score)?;
        info!(
            application_id = %application_id,
            priority_score = prediction.priority_score,
            predicted_status = %prediction.predicted_status,
            "application scored"
        );

        Ok(ScoredApplication {
            application,
            prediction,
        })
    }

    /// Application plus both model results, each reported independently.
    pub async fn insights(
        &self,
        application_id: ApplicationId,
    ) -> Result<ApplicationInsights, ScoringServiceError> {
        let view = self.review.get(application_id)?;
        let application = &view.application;

        let priority = self
            .client
            .predict_priority(&PriorityRequest::for_application(application))
            .await;

        let farmer_id = application.farmer_id.0.clone();
        let fraud = self
            .client
            .detect_fraud(&FraudRequest {
                applications: vec![FraudCandidate::from_application(application)],
            })
            .await
            .and_then(|report| {
                report
                    .assessment_for(&farmer_id)
                    .cloned()
                    .ok_or(ScoringError::MissingResult { farmer_id })
            });

        Ok(ApplicationInsights {
            priority: ModelOutcome::from_result("priority", priority),
            fraud: ModelOutcome::from_result("fraud", fraud),
            application: view,
        })
    }
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error(transparent)]
    Application(#[from] ApplicationServiceError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl Categorized for ScoringServiceError {
    fn category(&self) -> ErrorCategory {
        match self {
            ScoringServiceError::Application(error) => error.category(),
            ScoringServiceError::Scoring(_) => ErrorCategory::Dependency,
        }
    }
}
