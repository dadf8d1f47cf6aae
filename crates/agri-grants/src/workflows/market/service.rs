use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    MarketPrice, MarketPriceFilter, MarketPriceId, MarketPriceRequest, PriceValidationError,
};
use super::repository::MarketPriceRepository;
use crate::error::{Categorized, ErrorCategory};
use crate::storage::RepositoryError;

/// Admin-maintained crop price board.
pub struct MarketPriceService<M> {
    repository: Arc<M>,
}

impl<M> MarketPriceService<M>
where
    M: MarketPriceRepository + 'static,
{
    pub fn new(repository: Arc<M>) -> Self {
        Self { repository }
    }

    pub fn create(
        &self,
        request: MarketPriceRequest,
        updated_by: &str,
    ) -> Result<MarketPrice, MarketPriceError> {
        let entry = request.validate(updated_by, Utc::now())?;
        let mut stored = self.repository.insert_prices(vec![entry])?;
        let price = stored.pop().ok_or_else(|| {
            RepositoryError::Unavailable("insert returned no market price".to_string())
        })?;
        info!(price_id = %price.id, crop = %price.crop_name, "market price published");
        Ok(price)
    }

    /// Validate every entry before inserting any of them.
    pub fn bulk_create(
        &self,
        requests: Vec<MarketPriceRequest>,
        updated_by: &str,
    ) -> Result<Vec<MarketPrice>, MarketPriceError> {
        let now = Utc::now();
        let entries = requests
            .iter()
            .enumerate()
            .map(|(index, request)| {
                request
                    .validate(updated_by, now)
                    .map_err(|source| MarketPriceError::InvalidEntry { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let stored = self.repository.insert_prices(entries)?;
        info!(count = stored.len(), "market prices published in bulk");
        Ok(stored)
    }

    pub fn get(&self, id: MarketPriceId) -> Result<MarketPrice, MarketPriceError> {
        self.repository
            .fetch_price(id)?
            .ok_or(MarketPriceError::NotFound(id))
    }

    pub fn list_all(&self) -> Result<Vec<MarketPrice>, MarketPriceError> {
        Ok(self.repository.list_prices()?)
    }

    pub fn list_active(&self) -> Result<Vec<MarketPrice>, MarketPriceError> {
        self.filter(&MarketPriceFilter {
            is_active: Some(true),
            ..MarketPriceFilter::default()
        })
    }

    pub fn by_crop(&self, crop_name: &str) -> Result<Vec<MarketPrice>, MarketPriceError> {
        self.filter(&MarketPriceFilter {
            crop_name: Some(crop_name.to_string()),
            is_active: Some(true),
            ..MarketPriceFilter::default()
        })
    }

    pub fn by_location(&self, location: &str) -> Result<Vec<MarketPrice>, MarketPriceError> {
        self.filter(&MarketPriceFilter {
            location: Some(location.to_string()),
            is_active: Some(true),
            ..MarketPriceFilter::default()
        })
    }

    pub fn filter(&self, filter: &MarketPriceFilter) -> Result<Vec<MarketPrice>, MarketPriceError> {
        Ok(self
            .repository
            .list_prices()?
            .into_iter()
            .filter(|price| filter.matches(price))
            .collect())
    }

    pub fn update(
        &self,
        id: MarketPriceId,
        request: MarketPriceRequest,
        updated_by: &str,
    ) -> Result<MarketPrice, MarketPriceError> {
        let mut price = self.get(id)?;
        let entry = request.validate(updated_by, Utc::now())?;
        price.crop_name = entry.crop_name;
        price.price = entry.price;
        price.unit = entry.unit;
        price.location = entry.location;
        price.crop_photo = entry.crop_photo;
        price.updated_by = entry.updated_by;
        price.updated_at = entry.updated_at;
        self.repository.update_price(price.clone())?;
        Ok(price)
    }

    pub fn delete(&self, id: MarketPriceId) -> Result<(), MarketPriceError> {
        match self.repository.delete_price(id) {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(MarketPriceError::NotFound(id)),
            Err(other) => Err(other.into()),
        }
    }

    pub fn activate(&self, id: MarketPriceId) -> Result<MarketPrice, MarketPriceError> {
        self.set_active(id, true)
    }

    pub fn deactivate(&self, id: MarketPriceId) -> Result<MarketPrice, MarketPriceError> {
        self.set_active(id, false)
    }

    /// Crop names with an active price, sorted and deduplicated.
    pub fn distinct_crops(&self) -> Result<Vec<String>, MarketPriceError> {
        self.distinct(|price| price.crop_name.clone())
    }

    pub fn distinct_locations(&self) -> Result<Vec<String>, MarketPriceError> {
        self.distinct(|price| price.location.clone())
    }

    /// Newest active price for a crop at a location, matched without case.
    pub fn latest(&self, crop_name: &str, location: &str) -> Result<MarketPrice, MarketPriceError> {
        self.repository
            .list_prices()?
            .into_iter()
            .find(|price| {
                price.is_active
                    && price.crop_name.eq_ignore_ascii_case(crop_name)
                    && price.location.eq_ignore_ascii_case(location)
            })
            .ok_or_else(|| MarketPriceError::NoPriceFor {
                crop_name: crop_name.to_string(),
                location: location.to_string(),
            })
    }

    fn set_active(&self, id: MarketPriceId, active: bool) -> Result<MarketPrice, MarketPriceError> {
        let mut price = self.get(id)?;
        price.is_active = active;
        price.updated_at = Utc::now();
        self.repository.update_price(price.clone())?;
        Ok(price)
    }

    fn distinct(
        &self,
        key: impl Fn(&MarketPrice) -> String,
    ) -> Result<Vec<String>, MarketPriceError> {
        let values: BTreeSet<String> = self
            .repository
            .list_prices()?
            .iter()
            .filter(|price| price.is_active)
            .map(key)
            .collect();
        Ok(values.into_iter().collect())
    }
}

/// Error raised by the market price service.
#[derive(Debug, thiserror::Error)]
pub enum MarketPriceError {
    #[error(transparent)]
    Validation(#[from] PriceValidationError),
    #[error("entry {index}: {source}")]
    InvalidEntry {
        index: usize,
        source: PriceValidationError,
    },
    #[error("market price {0} not found")]
    NotFound(MarketPriceId),
    #[error("no active price for {crop_name} at {location}")]
    NoPriceFor { crop_name: String, location: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl Categorized for MarketPriceError {
    fn category(&self) -> ErrorCategory {
        match self {
            MarketPriceError::Validation(_) | MarketPriceError::InvalidEntry { .. } => {
                ErrorCategory::Validation
            }
            MarketPriceError::NotFound(_) | MarketPriceError::NoPriceFor { .. } => {
                ErrorCategory::NotFound
            }
            MarketPriceError::Repository(error) => error.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn service() -> MarketPriceService<MemoryStore> {
        MarketPriceService::new(Arc::new(MemoryStore::new()))
    }

    fn request(crop: &str, location: &str, price: f64) -> MarketPriceRequest {
        MarketPriceRequest {
            crop_name: crop.to_string(),
            price,
            unit: "kg".to_string(),
            location: location.to_string(),
            crop_photo: None,
        }
    }

    #[test]
    fn bulk_create_is_all_or_nothing() {
        let service = service();
        let err = service
            .bulk_create(
                vec![
                    request("Tomato", "Kalimati", 80.0),
                    request("Onion", "Kalimati", 0.0),
                ],
                "admin",
            )
            .expect_err("second entry invalid");
        assert!(matches!(
            err,
            MarketPriceError::InvalidEntry { index: 1, .. }
        ));
        assert!(service.list_all().expect("list").is_empty());
    }

    #[test]
    fn latest_prefers_most_recent_active_entry() {
        let service = service();
        let old = service
            .create(request("Tomato", "Kalimati", 70.0), "admin")
            .expect("created");
        let newer = service
            .create(request("tomato", "kalimati", 85.0), "admin")
            .expect("created");

        let latest = service.latest("TOMATO", "Kalimati").expect("latest");
        assert_eq!(latest.id, newer.id);

        service.deactivate(newer.id).expect("deactivated");
        let latest = service.latest("Tomato", "KALIMATI").expect("latest");
        assert_eq!(latest.id, old.id);
    }

    #[test]
    fn distinct_values_only_cover_active_entries() {
        let service = service();
        service
            .bulk_create(
                vec![
                    request("Tomato", "Kalimati", 80.0),
                    request("Potato", "Balkhu", 40.0),
                    request("Tomato", "Balkhu", 75.0),
                ],
                "admin",
            )
            .expect("created");
        let inactive = service
            .create(request("Garlic", "Pokhara", 300.0), "admin")
            .expect("created");
        service.deactivate(inactive.id).expect("deactivated");

        assert_eq!(
            service.distinct_crops().expect("crops"),
            vec!["Potato".to_string(), "Tomato".to_string()]
        );
        assert_eq!(
            service.distinct_locations().expect("locations"),
            vec!["Balkhu".to_string(), "Kalimati".to_string()]
        );
        assert_eq!(service.by_crop("tom").expect("by crop").len(), 2);
    }

    #[test]
    fn deleting_unknown_price_is_not_found() {
        let err = service()
            .delete(MarketPriceId(9))
            .expect_err("missing");
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}
