use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    Application, ApplicationFilter, ApplicationId, ApplicationStatus, ApplicationSummary,
    ApplicationView,
};
use super::error::ApplicationServiceError;
use super::lifecycle::TransitionPolicy;
use super::repository::{with_grants, ApplicationRepository};
use crate::workflows::grants::domain::GrantId;
use crate::workflows::grants::repository::GrantRepository;

/// Admin decision applied to one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: ApplicationStatus,
    #[serde(default)]
    pub admin_remarks: Option<String>,
}

/// Admin decision applied to several applications at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkStatusChange {
    pub application_ids: Vec<ApplicationId>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub admin_remarks: Option<String>,
}

/// Admin-facing service for reviewing and deciding applications.
pub struct ApplicationReviewService<S> {
    store: Arc<S>,
    policy: TransitionPolicy,
}

impl<S> ApplicationReviewService<S>
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    pub fn new(store: Arc<S>, policy: TransitionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Overwrite status and remarks of one application.
    pub fn update_status(
        &self,
        application_id: ApplicationId,
        change: StatusChange,
        updated_by: &str,
    ) -> Result<Application, ApplicationServiceError> {
        let mut updated = self.apply_status(&[application_id], &change, updated_by)?;
        let application = updated
            .pop()
            .ok_or(ApplicationServiceError::NotFound(application_id))?;

        info!(
            application_id = %application_id,
            status = change.status.label(),
            "application status updated"
        );
        Ok(application)
    }

    /// Apply one decision to every matched application, atomically.
    ///
    /// Fails when none of the ids exist. Under an enforced policy a single
    /// disallowed transition rejects the whole batch.
    pub fn bulk_update_status(
        &self,
        change: BulkStatusChange,
        updated_by: &str,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        let single = StatusChange {
            status: change.status,
            admin_remarks: change.admin_remarks,
        };
        let updated = self.apply_status(&change.application_ids, &single, updated_by)?;
        if updated.is_empty() {
            return Err(ApplicationServiceError::NoneMatched);
        }

        info!(
            requested = change.application_ids.len(),
            updated = updated.len(),
            status = single.status.label(),
            "bulk application status update"
        );
        Ok(updated)
    }

    /// First admin view of a pending application moves it to processing
    /// and records who opened it.
    pub fn mark_viewed(
        &self,
        application_id: ApplicationId,
        viewed_by: &str,
    ) -> Result<Application, ApplicationServiceError> {
        let now = Utc::now();
        self.store
            .modify_applications(&[application_id], |application| {
                if application.status == ApplicationStatus::Pending {
                    application.status = ApplicationStatus::Processing;
                    application.updated_at = Some(now);
                    application.updated_by = Some(viewed_by.to_string());
                }
                Ok::<(), ApplicationServiceError>(())
            })?
            .pop()
            .ok_or(ApplicationServiceError::NotFound(application_id))
    }

    pub fn attach_ai_score(
        &self,
        application_id: ApplicationId,
        score: f64,
    ) -> Result<Application, ApplicationServiceError> {
        if !score.is_finite() {
            return Err(ApplicationServiceError::InvalidScore);
        }

        let now = Utc::now();
        self.store
            .modify_applications(&[application_id], |application| {
                application.ai_score = Some(score);
                application.updated_at = Some(now);
                Ok::<(), ApplicationServiceError>(())
            })?
            .pop()
            .ok_or(ApplicationServiceError::NotFound(application_id))
    }

    /// Every application with its grant headline, newest first.
    pub fn list_all(&self) -> Result<Vec<ApplicationView>, ApplicationServiceError> {
        let applications = self
            .store
            .list_applications(&ApplicationFilter::default())?;
        Ok(with_grants(self.store.as_ref(), applications)?)
    }

    pub fn get(
        &self,
        application_id: ApplicationId,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let application = self
            .store
            .fetch_application(application_id)?
            .ok_or(ApplicationServiceError::NotFound(application_id))?;
        let grant = self.store.fetch_grant(application.grant_id)?;
        Ok(application.view(grant.as_ref()))
    }

    /// Summaries of a grant's applications, optionally narrowed to one status.
    pub fn list_for_grant(
        &self,
        grant_id: GrantId,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationSummary>, ApplicationServiceError> {
        if self.store.fetch_grant(grant_id)?.is_none() {
            return Err(ApplicationServiceError::GrantUnavailable(grant_id));
        }

        let filter = ApplicationFilter {
            status,
            ..ApplicationFilter::for_grant(grant_id)
        };
        Ok(self
            .store
            .list_applications(&filter)?
            .iter()
            .map(Application::summary)
            .collect())
    }

    fn apply_status(
        &self,
        ids: &[ApplicationId],
        change: &StatusChange,
        updated_by: &str,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        let policy = self.policy;
        let now = Utc::now();
        self.store.modify_applications(ids, |application| {
            policy.check(application.id, application.status, change.status)?;
            application.status = change.status;
            application.admin_remarks = change.admin_remarks.clone();
            application.updated_at = Some(now);
            application.updated_by = Some(updated_by.to_string());
            Ok::<(), ApplicationServiceError>(())
        })
    }
}
