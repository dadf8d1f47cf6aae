use agri_grants::config::AppConfig;
use agri_grants::error::AppError;
use agri_grants::scoring::{HttpScoringClient, ScoringService};
use agri_grants::seed::{self, SeedReport};
use agri_grants::storage::{LocalDocumentStore, MemoryStore};
use agri_grants::workflows::grants::applications::{
    ApplicationIntakeService, ApplicationReviewService, DocumentKind, UploadLimits,
};
use agri_grants::workflows::grants::{FarmerService, GrantCatalogService};
use agri_grants::workflows::market::MarketPriceService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Allowance for the text fields and multipart framing around the documents.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Every service the HTTP surface needs, wired over one in-memory store.
pub(crate) struct Portal {
    pub(crate) catalog: Arc<GrantCatalogService<MemoryStore>>,
    pub(crate) farmers: Arc<FarmerService<MemoryStore>>,
    pub(crate) intake: Arc<ApplicationIntakeService<MemoryStore, LocalDocumentStore>>,
    pub(crate) review: Arc<ApplicationReviewService<MemoryStore>>,
    pub(crate) market: Arc<MarketPriceService<MemoryStore>>,
    pub(crate) scoring: Arc<ScoringService<MemoryStore, HttpScoringClient>>,
}

impl Portal {
    pub(crate) fn in_memory(config: &AppConfig) -> Result<Self, AppError> {
        let store = Arc::new(MemoryStore::new());
        let documents = Arc::new(LocalDocumentStore::new(&config.storage.upload_dir));

        let review = Arc::new(ApplicationReviewService::new(
            store.clone(),
            config.lifecycle.transition_policy(),
        ));
        let client = Arc::new(HttpScoringClient::new(&config.scoring)?);

        Ok(Self {
            catalog: Arc::new(GrantCatalogService::new(store.clone())),
            farmers: Arc::new(FarmerService::new(store.clone())),
            intake: Arc::new(ApplicationIntakeService::new(
                store.clone(),
                documents,
                UploadLimits::new(config.storage.max_upload_bytes),
            )),
            market: Arc::new(MarketPriceService::new(store)),
            scoring: Arc::new(ScoringService::new(review.clone(), client)),
            review,
        })
    }

    pub(crate) fn seed_demo(&self) -> Result<SeedReport, AppError> {
        Ok(seed::load_demo(&self.catalog, &self.farmers, &self.market)?)
    }
}

/// Largest request body accepted: every document slot filled to the cap.
pub(crate) fn request_body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_mul(DocumentKind::ALL.len())
        .saturating_add(FORM_OVERHEAD_BYTES)
}
