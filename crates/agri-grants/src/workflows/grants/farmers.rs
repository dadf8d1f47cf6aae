use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use super::domain::{FarmerId, FarmerProfile};
use super::repository::FarmerDirectory;
use crate::auth::Caller;
use crate::error::{failure_response, Categorized, ErrorCategory};
use crate::storage::RepositoryError;

/// Profile fields a farmer may set for themselves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    pub ward_number: u32,
    pub municipality: String,
}

impl ProfileUpdate {
    fn into_profile(self, farmer_id: FarmerId) -> Result<FarmerProfile, FarmerError> {
        let required = |value: String, field: &'static str| {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                Err(FarmerError::BlankField(field))
            } else {
                Ok(trimmed)
            }
        };

        Ok(FarmerProfile {
            farmer_id,
            full_name: required(self.full_name, "full_name")?,
            phone: required(self.phone, "phone")?,
            email: self
                .email
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty()),
            address: required(self.address, "address")?,
            ward_number: self.ward_number,
            municipality: required(self.municipality, "municipality")?,
        })
    }
}

/// Registered farmer profiles, read at application time.
pub struct FarmerService<F> {
    directory: Arc<F>,
}

impl<F> FarmerService<F>
where
    F: FarmerDirectory + 'static,
{
    pub fn new(directory: Arc<F>) -> Self {
        Self { directory }
    }

    pub fn get_profile(&self, farmer_id: &FarmerId) -> Result<FarmerProfile, FarmerError> {
        self.directory
            .fetch_farmer(farmer_id)?
            .ok_or_else(|| FarmerError::NotFound(farmer_id.clone()))
    }

    pub fn upsert_profile(
        &self,
        farmer_id: FarmerId,
        update: ProfileUpdate,
    ) -> Result<FarmerProfile, FarmerError> {
        let profile = update.into_profile(farmer_id)?;
        let stored = self.directory.upsert_farmer(profile)?;
        info!(farmer_id = %stored.farmer_id, "farmer profile saved");
        Ok(stored)
    }

    pub fn list_profiles(&self) -> Result<Vec<FarmerProfile>, FarmerError> {
        Ok(self.directory.list_farmers()?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FarmerError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("farmer profile {0} not found")]
    NotFound(FarmerId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl Categorized for FarmerError {
    fn category(&self) -> ErrorCategory {
        match self {
            FarmerError::BlankField(_) => ErrorCategory::Validation,
            FarmerError::NotFound(_) => ErrorCategory::NotFound,
            FarmerError::Repository(error) => error.category(),
        }
    }
}

/// Router builder for profile endpoints.
pub fn farmer_router<F>(service: Arc<FarmerService<F>>) -> Router
where
    F: FarmerDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/farmers/me",
            get(own_profile_handler::<F>).put(save_profile_handler::<F>),
        )
        .route("/api/v1/farmers", get(list_profiles_handler::<F>))
        .with_state(service)
}

async fn own_profile_handler<F>(
    State(service): State<Arc<FarmerService<F>>>,
    caller: Caller,
) -> Response
where
    F: FarmerDirectory + 'static,
{
    let farmer_id = match caller.require_farmer() {
        Ok(farmer_id) => farmer_id,
        Err(rejection) => return rejection.into_response(),
    };

    match service.get_profile(&farmer_id) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn save_profile_handler<F>(
    State(service): State<Arc<FarmerService<F>>>,
    caller: Caller,
    Json(update): Json<ProfileUpdate>,
) -> Response
where
    F: FarmerDirectory + 'static,
{
    let farmer_id = match caller.require_farmer() {
        Ok(farmer_id) => farmer_id,
        Err(rejection) => return rejection.into_response(),
    };

    match service.upsert_profile(farmer_id, update) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn list_profiles_handler<F>(
    State(service): State<Arc<FarmerService<F>>>,
    caller: Caller,
) -> Response
where
    F: FarmerDirectory + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.list_profiles() {
        Ok(profiles) => (StatusCode::OK, Json(profiles)).into_response(),
        Err(error) => failure_response(&error),
    }
}
