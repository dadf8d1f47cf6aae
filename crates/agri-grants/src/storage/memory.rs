use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use super::RepositoryError;
use crate::workflows::grants::applications::{
    Application, ApplicationFilter, ApplicationId, ApplicationRepository, ApplicationStatus,
    NewApplication,
};
use crate::workflows::grants::domain::{FarmerId, FarmerProfile, Grant, GrantId, NewGrant};
use crate::workflows::grants::repository::{FarmerDirectory, GrantRepository};
use crate::workflows::market::domain::{MarketPrice, MarketPriceId, NewMarketPrice};
use crate::workflows::market::repository::MarketPriceRepository;

/// Process-local store implementing every repository port.
///
/// One mutex guards all tables so cross-table rules (application uniqueness,
/// restrict-delete of grants) are checked under the same lock as the write.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    last_grant_id: u64,
    grants: BTreeMap<GrantId, Grant>,
    last_application_id: u64,
    applications: BTreeMap<ApplicationId, Application>,
    farmers: BTreeMap<FarmerId, FarmerProfile>,
    last_price_id: u64,
    prices: BTreeMap<MarketPriceId, MarketPrice>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl GrantRepository for MemoryStore {
    fn insert_grant(&self, grant: NewGrant) -> Result<Grant, RepositoryError> {
        let mut state = self.lock()?;
        state.last_grant_id += 1;
        let id = GrantId(state.last_grant_id);

        let NewGrant {
            grant,
            created_by,
            created_at,
        } = grant;
        let stored = Grant {
            id,
            title: grant.title,
            description: grant.description,
            kind: grant.kind,
            amount: grant.amount,
            object_name: grant.object_name,
            photo_url: grant.photo_url,
            deadline_at: grant.deadline_at,
            created_by,
            created_at,
            updated_at: None,
            is_active: true,
            target_areas: grant.target_areas,
        };
        state.grants.insert(id, stored.clone());
        Ok(stored)
    }

    fn update_grant(&self, grant: Grant) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state.grants.get_mut(&grant.id) {
            Some(slot) => {
                *slot = grant;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_grant(&self, id: GrantId) -> Result<Option<Grant>, RepositoryError> {
        Ok(self.lock()?.grants.get(&id).cloned())
    }

    fn list_grants(&self) -> Result<Vec<Grant>, RepositoryError> {
        let mut grants: Vec<Grant> = self.lock()?.grants.values().cloned().collect();
        grants.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(grants)
    }

    fn delete_grant(&self, id: GrantId) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if !state.grants.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        let referencing = state
            .applications
            .values()
            .filter(|application| application.grant_id == id)
            .count();
        if referencing > 0 {
            return Err(RepositoryError::Conflict(format!(
                "grant {id} is referenced by {referencing} application(s)"
            )));
        }
        state.grants.remove(&id);
        Ok(())
    }
}

impl ApplicationRepository for MemoryStore {
    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        let mut state = self.lock()?;
        if !state.grants.contains_key(&application.grant_id) {
            return Err(RepositoryError::NotFound);
        }
        let duplicate = state.applications.values().any(|existing| {
            existing.grant_id == application.grant_id
                && existing.farmer_id == application.farmer_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict(format!(
                "farmer {} already applied for grant {}",
                application.farmer_id, application.grant_id
            )));
        }

        state.last_application_id += 1;
        let id = ApplicationId(state.last_application_id);
        let stored = Application {
            id,
            grant_id: application.grant_id,
            farmer_id: application.farmer_id,
            status: ApplicationStatus::Pending,
            details: application.details,
            documents: application.documents,
            ai_score: None,
            admin_remarks: None,
            submitted_at: application.submitted_at,
            updated_at: None,
            updated_by: None,
        };
        state.applications.insert(id, stored.clone());
        Ok(stored)
    }

    fn modify_applications<E, F>(
        &self,
        ids: &[ApplicationId],
        mut change: F,
    ) -> Result<Vec<Application>, E>
    where
        E: From<RepositoryError>,
        F: FnMut(&mut Application) -> Result<(), E>,
    {
        let mut state = self.lock()?;
        let mut visited: BTreeSet<ApplicationId> = BTreeSet::new();
        let mut updated: Vec<Application> = Vec::with_capacity(ids.len());

        for id in ids {
            if !visited.insert(*id) {
                continue;
            }

            if let Some(current) = state.applications.get(id) {
                let mut next = current.clone();
                change(&mut next)?;
                updated.push(next);
            }
        }

        for application in &updated {
            state
                .applications
                .insert(application.id, application.clone());
        }
        Ok(updated)
    }

    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn find_application(
        &self,
        farmer_id: &FarmerId,
        grant_id: GrantId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .find(|application| {
                application.grant_id == grant_id && &application.farmer_id == farmer_id
            })
            .cloned())
    }

    fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        let mut applications: Vec<Application> = self
            .lock()?
            .applications
            .values()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect();
        applications.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(applications)
    }
}

impl FarmerDirectory for MemoryStore {
    fn fetch_farmer(&self, id: &FarmerId) -> Result<Option<FarmerProfile>, RepositoryError> {
        Ok(self.lock()?.farmers.get(id).cloned())
    }

    fn upsert_farmer(&self, profile: FarmerProfile) -> Result<FarmerProfile, RepositoryError> {
        self.lock()?
            .farmers
            .insert(profile.farmer_id.clone(), profile.clone());
        Ok(profile)
    }

    fn list_farmers(&self) -> Result<Vec<FarmerProfile>, RepositoryError> {
        Ok(self.lock()?.farmers.values().cloned().collect())
    }
}

impl MarketPriceRepository for MemoryStore {
    fn insert_prices(
        &self,
        prices: Vec<NewMarketPrice>,
    ) -> Result<Vec<MarketPrice>, RepositoryError> {
        let mut state = self.lock()?;
        let mut stored = Vec::with_capacity(prices.len());
        for price in prices {
            state.last_price_id += 1;
            let id = MarketPriceId(state.last_price_id);
            let entry = MarketPrice {
                id,
                crop_name: price.crop_name,
                price: price.price,
                unit: price.unit,
                location: price.location,
                crop_photo: price.crop_photo,
                updated_by: price.updated_by,
                updated_at: price.updated_at,
                is_active: true,
            };
            state.prices.insert(id, entry.clone());
            stored.push(entry);
        }
        Ok(stored)
    }

    fn update_price(&self, price: MarketPrice) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state.prices.get_mut(&price.id) {
            Some(slot) => {
                *slot = price;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_price(&self, id: MarketPriceId) -> Result<Option<MarketPrice>, RepositoryError> {
        Ok(self.lock()?.prices.get(&id).cloned())
    }

    fn list_prices(&self) -> Result<Vec<MarketPrice>, RepositoryError> {
        let mut prices: Vec<MarketPrice> = self.lock()?.prices.values().cloned().collect();
        prices.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(prices)
    }

    fn delete_price(&self, id: MarketPriceId) -> Result<(), RepositoryError> {
        match self.lock()?.prices.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}
