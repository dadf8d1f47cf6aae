//! Grant catalog, farmer directory, and the application workflow built on them.

pub mod applications;
pub mod catalog;
pub mod domain;
pub mod eligibility;
pub mod farmers;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

pub use catalog::{GrantCatalogError, GrantCatalogService, GrantManagementView, StatusCounts};
pub use domain::{
    FarmerId, FarmerProfile, Grant, GrantDraft, GrantId, GrantKind, GrantValidationError,
    GrantView, TargetArea,
};
pub use eligibility::is_eligible;
pub use farmers::{farmer_router, FarmerError, FarmerService, ProfileUpdate};
pub use repository::{FarmerDirectory, GrantRepository};
pub use router::grant_router;
