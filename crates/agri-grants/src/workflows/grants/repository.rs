pub use crate::storage::RepositoryError;

use super::domain::{FarmerId, FarmerProfile, Grant, GrantId, NewGrant};

/// Storage abstraction for grants and their target areas.
pub trait GrantRepository: Send + Sync {
    /// Persist a new grant; the repository assigns the id.
    fn insert_grant(&self, grant: NewGrant) -> Result<Grant, RepositoryError>;
    /// Replace a stored grant, target areas included.
    fn update_grant(&self, grant: Grant) -> Result<(), RepositoryError>;
    fn fetch_grant(&self, id: GrantId) -> Result<Option<Grant>, RepositoryError>;
    /// All grants, newest first.
    fn list_grants(&self) -> Result<Vec<Grant>, RepositoryError>;
    /// Remove a grant. Fails with `Conflict` while applications reference it.
    fn delete_grant(&self, id: GrantId) -> Result<(), RepositoryError>;
}

/// Registered farmer profiles keyed by identity.
pub trait FarmerDirectory: Send + Sync {
    fn fetch_farmer(&self, id: &FarmerId) -> Result<Option<FarmerProfile>, RepositoryError>;
    fn upsert_farmer(&self, profile: FarmerProfile) -> Result<FarmerProfile, RepositoryError>;
    fn list_farmers(&self) -> Result<Vec<FarmerProfile>, RepositoryError>;
}
