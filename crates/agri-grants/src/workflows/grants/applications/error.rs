use super::documents::DocumentError;
use super::domain::{ApplicantValidationError, ApplicationId, ApplicationStatus};
use super::lifecycle::TransitionRejected;
use crate::error::{Categorized, ErrorCategory};
use crate::storage::RepositoryError;
use crate::workflows::grants::domain::{FarmerId, GrantId};

/// Error raised by the intake and review services.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Validation(#[from] ApplicantValidationError),
    #[error("admin score must be a finite number")]
    InvalidScore,
    #[error("grant {0} not found or not accepting applications")]
    GrantUnavailable(GrantId),
    #[error("farmer profile {0} not found")]
    FarmerNotFound(FarmerId),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("no applications matched the supplied ids")]
    NoneMatched,
    #[error("farmer is not eligible for grant {0}: ward and municipality are outside its target areas")]
    Ineligible(GrantId),
    #[error("farmer has already applied for grant {0}")]
    AlreadyApplied(GrantId),
    #[error("application {0} belongs to another farmer")]
    NotOwner(ApplicationId),
    #[error("application can only be edited while pending (current status: {0})")]
    NotEditable(ApplicationStatus),
    #[error(transparent)]
    Transition(#[from] TransitionRejected),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("background worker failed: {0}")]
    Worker(String),
}

impl Categorized for ApplicationServiceError {
    fn category(&self) -> ErrorCategory {
        match self {
            ApplicationServiceError::Validation(_) | ApplicationServiceError::InvalidScore => {
                ErrorCategory::Validation
            }
            ApplicationServiceError::GrantUnavailable(_)
            | ApplicationServiceError::FarmerNotFound(_)
            | ApplicationServiceError::NotFound(_)
            | ApplicationServiceError::NoneMatched => ErrorCategory::NotFound,
            ApplicationServiceError::Ineligible(_) | ApplicationServiceError::NotOwner(_) => {
                ErrorCategory::Forbidden
            }
            ApplicationServiceError::AlreadyApplied(_)
            | ApplicationServiceError::NotEditable(_)
            | ApplicationServiceError::Transition(_) => ErrorCategory::Conflict,
            ApplicationServiceError::Document(error) if error.is_rejection() => {
                ErrorCategory::Validation
            }
            ApplicationServiceError::Document(_) | ApplicationServiceError::Worker(_) => {
                ErrorCategory::Dependency
            }
            ApplicationServiceError::Repository(error) => error.category(),
        }
    }
}
