//! Storage adapters backing the workflow repositories.

use crate::error::{Categorized, ErrorCategory};

pub mod files;
pub mod memory;

pub use files::LocalDocumentStore;
pub use memory::MemoryStore;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record conflicts with existing data: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl Categorized for RepositoryError {
    fn category(&self) -> ErrorCategory {
        match self {
            RepositoryError::Conflict(_) => ErrorCategory::Conflict,
            RepositoryError::NotFound => ErrorCategory::NotFound,
            RepositoryError::Unavailable(_) => ErrorCategory::Dependency,
        }
    }
}
