use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::documents::DocumentStore;
use super::domain::{ApplicationId, ApplicationStatus};
use super::error::ApplicationServiceError;
use super::form::ApplicationForm;
use super::intake::ApplicationIntakeService;
use super::repository::ApplicationRepository;
use super::review::{ApplicationReviewService, BulkStatusChange, StatusChange};
use crate::auth::Caller;
use crate::error::failure_response;
use crate::workflows::grants::domain::GrantId;
use crate::workflows::grants::repository::{FarmerDirectory, GrantRepository};

/// Shared state for the application endpoints.
pub struct ApplicationState<S, D> {
    pub intake: Arc<ApplicationIntakeService<S, D>>,
    pub review: Arc<ApplicationReviewService<S>>,
}

impl<S, D> Clone for ApplicationState<S, D> {
    fn clone(&self) -> Self {
        Self {
            intake: Arc::clone(&self.intake),
            review: Arc::clone(&self.review),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Deserialize)]
pub struct AiScoreRequest {
    pub ai_score: f64,
}

/// Router builder exposing farmer intake and admin review endpoints.
pub fn application_router<S, D>(
    intake: Arc<ApplicationIntakeService<S, D>>,
    review: Arc<ApplicationReviewService<S>>,
) -> Router
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications",
            post(submit_handler::<S, D>).get(list_all_handler::<S, D>),
        )
        .route("/api/v1/applications/mine", get(list_mine_handler::<S, D>))
        .route(
            "/api/v1/applications/mine/:application_id",
            get(get_mine_handler::<S, D>),
        )
        .route(
            "/api/v1/applications/bulk-status",
            put(bulk_status_handler::<S, D>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(get_handler::<S, D>).put(update_handler::<S, D>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(status_handler::<S, D>),
        )
        .route(
            "/api/v1/applications/:application_id/view",
            post(view_handler::<S, D>),
        )
        .route(
            "/api/v1/applications/:application_id/ai-score",
            put(ai_score_handler::<S, D>),
        )
        .route(
            "/api/v1/grants/management/:grant_id/applications",
            get(grant_applications_handler::<S, D>),
        )
        .with_state(ApplicationState { intake, review })
}

fn service_failure(error: ApplicationServiceError) -> Response {
    failure_response(&error)
}

/// Run intake work on the blocking pool; document writes hit the disk.
pub(crate) async fn offload<T, F>(work: F) -> Result<T, ApplicationServiceError>
where
    F: FnOnce() -> Result<T, ApplicationServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|error| ApplicationServiceError::Worker(error.to_string()))?
}

pub(crate) async fn submit_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    caller: Caller,
    multipart: Multipart,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    let farmer_id = match caller.require_farmer() {
        Ok(farmer_id) => farmer_id,
        Err(rejection) => return rejection.into_response(),
    };

    let form = match ApplicationForm::read(multipart).await {
        Ok(form) => form,
        Err(error) => return service_failure(error.into()),
    };
    let submission = form
        .grant_id()
        .and_then(|grant_id| form.details().map(|details| (grant_id, details)));
    let (grant_id, details) = match submission {
        Ok(parsed) => parsed,
        Err(error) => return service_failure(error.into()),
    };

    let intake = Arc::clone(&state.intake);
    let submitted =
        offload(move || intake.submit(grant_id, &farmer_id, details, form.uploads)).await;
    match submitted {
        Ok(application) => (StatusCode::CREATED, Json(application)).into_response(),
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn update_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    Path(application_id): Path<u64>,
    caller: Caller,
    multipart: Multipart,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    let farmer_id = match caller.require_farmer() {
        Ok(farmer_id) => farmer_id,
        Err(rejection) => return rejection.into_response(),
    };

    let form = match ApplicationForm::read(multipart).await {
        Ok(form) => form,
        Err(error) => return service_failure(error.into()),
    };
    let patch = match form.patch() {
        Ok(patch) => patch,
        Err(error) => return service_failure(error.into()),
    };

    let intake = Arc::clone(&state.intake);
    let updated_by = caller.audit_name();
    let updated = offload(move || {
        intake.update(
            ApplicationId(application_id),
            &farmer_id,
            patch,
            form.uploads,
            &updated_by,
        )
    })
    .await;
    match updated {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn list_mine_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    let farmer_id = match caller.require_farmer() {
        Ok(farmer_id) => farmer_id,
        Err(rejection) => return rejection.into_response(),
    };

    match state.intake.list_for_farmer(&farmer_id) {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn get_mine_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    Path(application_id): Path<u64>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    let farmer_id = match caller.require_farmer() {
        Ok(farmer_id) => farmer_id,
        Err(rejection) => return rejection.into_response(),
    };

    match state
        .intake
        .get_for_farmer(ApplicationId(application_id), &farmer_id)
    {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn list_all_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match state.review.list_all() {
        Ok(applications) => (StatusCode::OK, Json(applications)).into_response(),
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn get_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    Path(application_id): Path<u64>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match state.review.get(ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn status_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    Path(application_id): Path<u64>,
    caller: Caller,
    Json(change): Json<StatusChange>,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match state.review.update_status(
        ApplicationId(application_id),
        change,
        &caller.audit_name(),
    ) {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn bulk_status_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    caller: Caller,
    Json(change): Json<BulkStatusChange>,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match state
        .review
        .bulk_update_status(change, &caller.audit_name())
    {
        Ok(updated) => {
            let payload = serde_json::json!({
                "updated": updated.len(),
                "applications": updated,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn view_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    Path(application_id): Path<u64>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match state
        .review
        .mark_viewed(ApplicationId(application_id), &caller.audit_name())
    {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn ai_score_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    Path(application_id): Path<u64>,
    caller: Caller,
    Json(request): Json<AiScoreRequest>,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match state
        .review
        .attach_ai_score(ApplicationId(application_id), request.ai_score)
    {
        Ok(application) => (StatusCode::OK, Json(application)).into_response(),
        Err(error) => service_failure(error),
    }
}

pub(crate) async fn grant_applications_handler<S, D>(
    State(state): State<ApplicationState<S, D>>,
    Path(grant_id): Path<u64>,
    Query(query): Query<StatusQuery>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + FarmerDirectory + 'static,
    D: DocumentStore + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match state.review.list_for_grant(GrantId(grant_id), query.status) {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(error) => service_failure(error),
    }
}
