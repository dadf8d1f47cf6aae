use std::collections::HashMap;

use super::domain::{Application, ApplicationFilter, ApplicationId, ApplicationView, NewApplication};
use crate::storage::RepositoryError;
use crate::workflows::grants::domain::{FarmerId, GrantId};
use crate::workflows::grants::repository::GrantRepository;

/// Storage abstraction so the intake and review services can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    /// Persist a new application with status `Pending`.
    ///
    /// Fails with `Conflict` when the farmer already applied for the grant;
    /// the check and the write happen atomically.
    fn insert_application(&self, application: NewApplication)
        -> Result<Application, RepositoryError>;

    /// Apply `change` to every stored application among `ids` in one
    /// critical section and return the updated records.
    ///
    /// Unknown ids are skipped. If `change` fails for any record nothing is
    /// written and the error is returned.
    fn modify_applications<E, F>(
        &self,
        ids: &[ApplicationId],
        change: F,
    ) -> Result<Vec<Application>, E>
    where
        E: From<RepositoryError>,
        F: FnMut(&mut Application) -> Result<(), E>;

    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;

    fn find_application(
        &self,
        farmer_id: &FarmerId,
        grant_id: GrantId,
    ) -> Result<Option<Application>, RepositoryError>;

    /// Matching applications, newest first.
    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError>;
}

/// Join applications with the grants they reference.
pub(crate) fn with_grants<S>(
    store: &S,
    applications: Vec<Application>,
) -> Result<Vec<ApplicationView>, RepositoryError>
where
    S: GrantRepository + ?Sized,
{
    let grants: HashMap<GrantId, _> = store
        .list_grants()?
        .into_iter()
        .map(|grant| (grant.id, grant))
        .collect();

    Ok(applications
        .into_iter()
        .map(|application| {
            let grant = grants.get(&application.grant_id);
            application.view(grant)
        })
        .collect())
}
