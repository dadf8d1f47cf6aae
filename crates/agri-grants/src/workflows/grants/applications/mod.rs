//! Grant application intake (farmer side) and review (admin side).

pub mod documents;
pub mod domain;
pub mod error;
pub mod form;
pub mod intake;
pub mod lifecycle;
pub mod repository;
pub mod review;
pub mod router;

#[cfg(test)]
mod tests;

pub use documents::{DocumentError, DocumentKind, DocumentStore, DocumentUpload, UploadLimits};
pub use domain::{
    ApplicantDetails, ApplicantPatch, ApplicantValidationError, Application, ApplicationFilter,
    ApplicationId, ApplicationStatus, ApplicationSummary, ApplicationView, DocumentUrls,
    NewApplication,
};
pub use error::ApplicationServiceError;
pub use intake::ApplicationIntakeService;
pub use lifecycle::{TransitionPolicy, TransitionRejected};
pub use repository::ApplicationRepository;
pub use review::{ApplicationReviewService, BulkStatusChange, StatusChange};
pub use router::{application_router, ApplicationState};
