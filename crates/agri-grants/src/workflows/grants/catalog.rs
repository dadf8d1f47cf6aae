use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::applications::{
    Application, ApplicationFilter, ApplicationRepository, ApplicationStatus, ApplicationSummary,
};
use super::domain::{Grant, GrantDraft, GrantId, GrantValidationError, GrantView, NewGrant};
use super::repository::GrantRepository;
use crate::error::{Categorized, ErrorCategory};
use crate::storage::RepositoryError;

/// Number of recent applications shown on a grant's management page.
pub const RECENT_APPLICATIONS: usize = 5;

/// Application totals per review state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn tally<'a>(applications: impl IntoIterator<Item = &'a Application>) -> Self {
        applications
            .into_iter()
            .fold(Self::default(), |mut counts, application| {
                counts.total += 1;
                match application.status {
                    ApplicationStatus::Pending => counts.pending += 1,
                    ApplicationStatus::Processing => counts.processing += 1,
                    ApplicationStatus::Approved => counts.approved += 1,
                    ApplicationStatus::Rejected => counts.rejected += 1,
                }
                counts
            })
    }
}

/// Grant with application statistics for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantManagementView {
    pub grant: Grant,
    pub counts: StatusCounts,
    pub recent_applications: Vec<ApplicationSummary>,
}

/// Admin catalog of grants plus the public listings farmers browse.
pub struct GrantCatalogService<S> {
    store: Arc<S>,
}

impl<S> GrantCatalogService<S>
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        draft: GrantDraft,
        created_by: &str,
    ) -> Result<GrantView, GrantCatalogError> {
        let grant = draft.validate()?;
        let stored = self.store.insert_grant(NewGrant {
            grant,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        })?;

        info!(
            grant_id = %stored.id,
            target_areas = stored.target_areas.len(),
            "grant created"
        );
        Ok(GrantView {
            grant: stored,
            application_count: 0,
        })
    }

    pub fn get(&self, grant_id: GrantId) -> Result<GrantView, GrantCatalogError> {
        let grant = self.fetch(grant_id)?;
        let application_count = self
            .store
            .list_applications(&ApplicationFilter::for_grant(grant_id))?
            .len();
        Ok(GrantView {
            grant,
            application_count,
        })
    }

    pub fn list_all(&self) -> Result<Vec<GrantView>, GrantCatalogError> {
        self.views(|_| true)
    }

    pub fn list_active(&self) -> Result<Vec<GrantView>, GrantCatalogError> {
        self.views(|grant| grant.is_active)
    }

    /// Active grants targeting any ward of the municipality.
    pub fn list_by_municipality(
        &self,
        municipality: &str,
    ) -> Result<Vec<GrantView>, GrantCatalogError> {
        self.views(|grant| {
            grant.is_active
                && grant
                    .target_areas
                    .iter()
                    .any(|area| area.municipality == municipality)
        })
    }

    /// Replace every editable field and the target areas.
    pub fn update(
        &self,
        grant_id: GrantId,
        draft: GrantDraft,
    ) -> Result<GrantView, GrantCatalogError> {
        let validated = draft.validate()?;
        let mut grant = self.fetch(grant_id)?;
        grant.apply(validated, Utc::now());
        self.store.update_grant(grant)?;

        info!(grant_id = %grant_id, "grant updated");
        self.get(grant_id)
    }

    pub fn activate(&self, grant_id: GrantId) -> Result<GrantView, GrantCatalogError> {
        self.set_active(grant_id, true)
    }

    pub fn deactivate(&self, grant_id: GrantId) -> Result<GrantView, GrantCatalogError> {
        self.set_active(grant_id, false)
    }

    pub fn delete(&self, grant_id: GrantId) -> Result<(), GrantCatalogError> {
        match self.store.delete_grant(grant_id) {
            Ok(()) => {
                info!(grant_id = %grant_id, "grant deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(GrantCatalogError::NotFound(grant_id)),
            Err(RepositoryError::Conflict(_)) => Err(GrantCatalogError::HasApplications(grant_id)),
            Err(other) => Err(other.into()),
        }
    }

    /// Status counts and the most recent applications for one grant.
    pub fn management(&self, grant_id: GrantId) -> Result<GrantManagementView, GrantCatalogError> {
        let grant = self.fetch(grant_id)?;
        let applications = self
            .store
            .list_applications(&ApplicationFilter::for_grant(grant_id))?;

        Ok(GrantManagementView {
            grant,
            counts: StatusCounts::tally(&applications),
            recent_applications: applications
                .iter()
                .take(RECENT_APPLICATIONS)
                .map(Application::summary)
                .collect(),
        })
    }

    /// Status counts for every grant, newest grant first.
    pub fn management_overview(&self) -> Result<Vec<GrantManagementView>, GrantCatalogError> {
        let applications = self
            .store
            .list_applications(&ApplicationFilter::default())?;
        let mut by_grant: HashMap<GrantId, Vec<&Application>> = HashMap::new();
        for application in &applications {
            by_grant
                .entry(application.grant_id)
                .or_default()
                .push(application);
        }

        Ok(self
            .store
            .list_grants()?
            .into_iter()
            .map(|grant| {
                let counts = by_grant
                    .get(&grant.id)
                    .map(|rows| StatusCounts::tally(rows.iter().copied()))
                    .unwrap_or_default();
                GrantManagementView {
                    grant,
                    counts,
                    recent_applications: Vec::new(),
                }
            })
            .collect())
    }

    fn fetch(&self, grant_id: GrantId) -> Result<Grant, GrantCatalogError> {
        self.store
            .fetch_grant(grant_id)?
            .ok_or(GrantCatalogError::NotFound(grant_id))
    }

    fn set_active(&self, grant_id: GrantId, active: bool) -> Result<GrantView, GrantCatalogError> {
        let mut grant = self.fetch(grant_id)?;
        grant.is_active = active;
        grant.updated_at = Some(Utc::now());
        self.store.update_grant(grant)?;

        info!(grant_id = %grant_id, active, "grant availability changed");
        self.get(grant_id)
    }

    fn views(&self, keep: impl Fn(&Grant) -> bool) -> Result<Vec<GrantView>, GrantCatalogError> {
        let mut counts: HashMap<GrantId, usize> = HashMap::new();
        for application in self
            .store
            .list_applications(&ApplicationFilter::default())?
        {
            *counts.entry(application.grant_id).or_default() += 1;
        }

        Ok(self
            .store
            .list_grants()?
            .into_iter()
            .filter(|grant| keep(grant))
            .map(|grant| GrantView {
                application_count: counts.get(&grant.id).copied().unwrap_or(0),
                grant,
            })
            .collect())
    }
}

/// Error raised by the grant catalog.
#[derive(Debug, thiserror::Error)]
pub enum GrantCatalogError {
    #[error(transparent)]
    Validation(#[from] GrantValidationError),
    #[error("grant {0} not found")]
    NotFound(GrantId),
    #[error("grant {0} has applications and cannot be deleted; deactivate it instead")]
    HasApplications(GrantId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl Categorized for GrantCatalogError {
    fn category(&self) -> ErrorCategory {
        match self {
            GrantCatalogError::Validation(_) => ErrorCategory::Validation,
            GrantCatalogError::NotFound(_) => ErrorCategory::NotFound,
            GrantCatalogError::HasApplications(_) => ErrorCategory::Conflict,
            GrantCatalogError::Repository(error) => error.category(),
        }
    }
}
