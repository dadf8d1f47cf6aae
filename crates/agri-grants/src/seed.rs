//! Demo bootstrap data, loaded once at startup when enabled.

use chrono::{Duration, Utc};
use tracing::info;

use crate::workflows::grants::applications::ApplicationRepository;
use crate::workflows::grants::{
    FarmerDirectory, FarmerError, FarmerId, FarmerService, GrantCatalogError, GrantCatalogService,
    GrantDraft, GrantKind, GrantRepository, ProfileUpdate,
};
use crate::workflows::market::{
    MarketPriceError, MarketPriceRepository, MarketPriceRequest, MarketPriceService,
};

/// Identity recorded as creator of seeded records.
pub const SEED_AUTHOR: &str = "system";

/// Farmer profile registered by the demo seed.
pub const DEMO_FARMER: &str = "demo-farmer";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub grants: usize,
    pub farmers: usize,
    pub market_prices: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("seeding grants failed: {0}")]
    Grant(#[from] GrantCatalogError),
    #[error("seeding farmer profiles failed: {0}")]
    Farmer(#[from] FarmerError),
    #[error("seeding market prices failed: {0}")]
    Market(#[from] MarketPriceError),
}

fn demo_grants() -> Vec<GrantDraft> {
    let deadline = Some(Utc::now() + Duration::days(60));
    vec![
        GrantDraft {
            title: "Shallow tube well subsidy".to_string(),
            description: "Cash support for installing shallow tube wells ahead of the dry season."
                .to_string(),
            kind: GrantKind::Money,
            amount: Some(40000.0),
            object_name: None,
            photo_url: None,
            deadline_at: deadline,
            target_wards: vec![3, 4, 5],
            target_municipalities: vec!["Bharatpur".to_string()],
        },
        GrantDraft {
            title: "Power tiller distribution".to_string(),
            description: "Shared power tillers for farmer groups with small landholdings."
                .to_string(),
            kind: GrantKind::Object,
            amount: None,
            object_name: Some("Power tiller".to_string()),
            photo_url: None,
            deadline_at: deadline,
            target_wards: vec![1, 2],
            target_municipalities: vec!["Bharatpur".to_string(), "Ratnanagar".to_string()],
        },
    ]
}

fn demo_prices() -> Vec<MarketPriceRequest> {
    [("Rice", 2500.0), ("Corn", 2200.0)]
        .into_iter()
        .map(|(crop_name, price)| MarketPriceRequest {
            crop_name: crop_name.to_string(),
            price,
            unit: "per muri".to_string(),
            location: "Kathmandu".to_string(),
            crop_photo: None,
        })
        .collect()
}

/// Publish demo grants, one farmer profile, and a starter set of market prices.
pub fn load_demo<S>(
    catalog: &GrantCatalogService<S>,
    farmers: &FarmerService<S>,
    market: &MarketPriceService<S>,
) -> Result<SeedReport, SeedError>
where
    S: GrantRepository
        + ApplicationRepository
        + FarmerDirectory
        + MarketPriceRepository
        + 'static,
{
    let mut report = SeedReport::default();

    for draft in demo_grants() {
        catalog.create(draft, SEED_AUTHOR)?;
        report.grants += 1;
    }

    farmers.upsert_profile(
        FarmerId(DEMO_FARMER.to_string()),
        ProfileUpdate {
            full_name: "Sita Tharu".to_string(),
            phone: "9800000000".to_string(),
            email: None,
            address: "Ward 3, Bharatpur".to_string(),
            ward_number: 3,
            municipality: "Bharatpur".to_string(),
        },
    )?;
    report.farmers += 1;

    report.market_prices = market.bulk_create(demo_prices(), SEED_AUTHOR)?.len();

    info!(
        grants = report.grants,
        farmers = report.farmers,
        market_prices = report.market_prices,
        "demo data loaded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn demo_seed_is_visible_through_the_services() {
        let store = Arc::new(MemoryStore::new());
        let catalog = GrantCatalogService::new(store.clone());
        let farmers = FarmerService::new(store.clone());
        let market = MarketPriceService::new(store);

        let report = load_demo(&catalog, &farmers, &market).expect("seeded");
        assert_eq!(
            report,
            SeedReport {
                grants: 2,
                farmers: 1,
                market_prices: 2,
            }
        );

        assert_eq!(catalog.list_active().expect("grants").len(), 2);
        assert_eq!(
            catalog
                .list_by_municipality("Ratnanagar")
                .expect("by municipality")
                .len(),
            1
        );
        let profile = farmers
            .get_profile(&FarmerId(DEMO_FARMER.to_string()))
            .expect("profile");
        assert_eq!(profile.ward_number, 3);
        assert_eq!(
            market.latest("Rice", "Kathmandu").expect("latest").price,
            2500.0
        );
    }
}
