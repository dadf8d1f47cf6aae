use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::documents::{DocumentKind, DocumentStore, DocumentUpload, UploadLimits};
use super::domain::{
    ApplicantDetails, ApplicantPatch, Application, ApplicationFilter, ApplicationId,
    ApplicationStatus, ApplicationView, DocumentUrls, NewApplication,
};
use super::error::ApplicationServiceError;
use super::repository::{with_grants, ApplicationRepository};
use crate::storage::RepositoryError;
use crate::workflows::grants::domain::{FarmerId, GrantId};
use crate::workflows::grants::eligibility::is_eligible;
use crate::workflows::grants::repository::{FarmerDirectory, GrantRepository};

/// Farmer-facing service: submission, edits, and reads of own applications.
pub struct ApplicationIntakeService<S, D> {
    store: Arc<S>,
    documents: Arc<D>,
    limits: UploadLimits,
}

impl<S, D> ApplicationIntakeService<S, D>
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(store: Arc<S>, documents: Arc<D>, limits: UploadLimits) -> Self {
        Self {
            store,
            documents,
            limits,
        }
    }

    /// Submit an application for an active grant.
    ///
    /// Documents are stored before the record is inserted; if the insert
    /// fails they are removed again.
    pub fn submit(
        &self,
        grant_id: GrantId,
        farmer_id: &FarmerId,
        details: ApplicantDetails,
        uploads: Vec<DocumentUpload>,
    ) -> Result<Application, ApplicationServiceError> {
        details.validate()?;

        let grant = self
            .store
            .fetch_grant(grant_id)?
            .filter(|grant| grant.is_active)
            .ok_or(ApplicationServiceError::GrantUnavailable(grant_id))?;

        let profile = self
            .store
            .fetch_farmer(farmer_id)?
            .ok_or_else(|| ApplicationServiceError::FarmerNotFound(farmer_id.clone()))?;

        if !is_eligible(
            profile.ward_number,
            &profile.municipality,
            &grant.target_areas,
        ) {
            return Err(ApplicationServiceError::Ineligible(grant_id));
        }

        if self.store.find_application(farmer_id, grant_id)?.is_some() {
            return Err(ApplicationServiceError::AlreadyApplied(grant_id));
        }

        self.limits.check(&uploads)?;
        let stored = self.store_documents(farmer_id, &uploads)?;

        let mut documents = DocumentUrls::default();
        for (kind, url) in &stored {
            documents.replace(*kind, url.clone());
        }

        let inserted = self.store.insert_application(NewApplication {
            grant_id,
            farmer_id: farmer_id.clone(),
            details,
            documents,
            submitted_at: Utc::now(),
        });

        match inserted {
            Ok(application) => {
                info!(
                    application_id = %application.id,
                    grant_id = %grant_id,
                    farmer_id = %farmer_id,
                    documents = stored.len(),
                    "grant application submitted"
                );
                Ok(application)
            }
            Err(error) => {
                self.discard(stored.iter().map(|(_, url)| url.as_str()));
                match error {
                    RepositoryError::Conflict(_) => {
                        Err(ApplicationServiceError::AlreadyApplied(grant_id))
                    }
                    other => Err(other.into()),
                }
            }
        }
    }

    /// Apply a farmer's partial edit to their own pending application.
    pub fn update(
        &self,
        application_id: ApplicationId,
        farmer_id: &FarmerId,
        patch: ApplicantPatch,
        uploads: Vec<DocumentUpload>,
        updated_by: &str,
    ) -> Result<Application, ApplicationServiceError> {
        let current = self
            .store
            .fetch_application(application_id)?
            .ok_or(ApplicationServiceError::NotFound(application_id))?;
        ensure_editable(&current, farmer_id)?;

        let mut preview = current.details.clone();
        patch.clone().apply_to(&mut preview);
        preview.validate()?;

        self.limits.check(&uploads)?;
        let stored = self.store_documents(farmer_id, &uploads)?;

        let now = Utc::now();
        let mut replaced: Vec<String> = Vec::new();
        let mut patch = Some(patch);
        let outcome = self
            .store
            .modify_applications(&[application_id], |application| {
                ensure_editable(application, farmer_id)?;
                if let Some(patch) = patch.take() {
                    patch.apply_to(&mut application.details);
                }
                application.details.validate()?;
                for (kind, url) in &stored {
                    if let Some(previous) = application.documents.replace(*kind, url.clone()) {
                        replaced.push(previous);
                    }
                }
                application.updated_at = Some(now);
                application.updated_by = Some(updated_by.to_string());
                Ok::<(), ApplicationServiceError>(())
            })
            .and_then(|updated| {
                updated
                    .into_iter()
                    .next()
                    .ok_or(ApplicationServiceError::NotFound(application_id))
            });

        match outcome {
            Ok(application) => {
                self.discard(replaced.iter().map(String::as_str));
                info!(
                    application_id = %application_id,
                    farmer_id = %farmer_id,
                    documents = stored.len(),
                    "grant application edited"
                );
                Ok(application)
            }
            Err(error) => {
                self.discard(stored.iter().map(|(_, url)| url.as_str()));
                Err(error)
            }
        }
    }

    /// The farmer's own applications, newest first.
    pub fn list_for_farmer(
        &self,
        farmer_id: &FarmerId,
    ) -> Result<Vec<ApplicationView>, ApplicationServiceError> {
        let applications = self
            .store
            .list_applications(&ApplicationFilter::for_farmer(farmer_id.clone()))?;
        Ok(with_grants(self.store.as_ref(), applications)?)
    }

    /// One of the farmer's own applications. Other farmers' records read as absent.
    pub fn get_for_farmer(
        &self,
        application_id: ApplicationId,
        farmer_id: &FarmerId,
    ) -> Result<ApplicationView, ApplicationServiceError> {
        let application = self
            .store
            .fetch_application(application_id)?
            .filter(|application| &application.farmer_id == farmer_id)
            .ok_or(ApplicationServiceError::NotFound(application_id))?;

        let grant = self.store.fetch_grant(application.grant_id)?;
        Ok(application.view(grant.as_ref()))
    }

    fn store_documents(
        &self,
        owner: &FarmerId,
        uploads: &[DocumentUpload],
    ) -> Result<Vec<(DocumentKind, String)>, ApplicationServiceError> {
        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.documents.store(owner, upload) {
                Ok(url) => stored.push((upload.kind, url)),
                Err(error) => {
                    self.discard(stored.iter().map(|(_, url)| url.as_str()));
                    return Err(error.into());
                }
            }
        }
        Ok(stored)
    }

    fn discard<'a>(&self, urls: impl Iterator<Item = &'a str>) {
        for url in urls {
            if let Err(error) = self.documents.remove(url) {
                warn!(url, error = %error, "failed to remove stored document");
            }
        }
    }
}

fn ensure_editable(
    application: &Application,
    farmer_id: &FarmerId,
) -> Result<(), ApplicationServiceError> {
    if &application.farmer_id != farmer_id {
        return Err(ApplicationServiceError::NotOwner(application.id));
    }
    if application.status != ApplicationStatus::Pending {
        return Err(ApplicationServiceError::NotEditable(application.status));
    }
    Ok(())
}
