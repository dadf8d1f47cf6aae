use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::applications::ApplicationRepository;
use super::catalog::GrantCatalogService;
use super::domain::{GrantDraft, GrantId};
use super::repository::GrantRepository;
use crate::auth::Caller;
use crate::error::failure_response;

/// Router builder for grant catalog and management endpoints.
pub fn grant_router<S>(service: Arc<GrantCatalogService<S>>) -> Router
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/grants",
            post(create_handler::<S>).get(list_all_handler::<S>),
        )
        .route("/api/v1/grants/active", get(list_active_handler::<S>))
        .route(
            "/api/v1/grants/municipality/:municipality",
            get(by_municipality_handler::<S>),
        )
        .route("/api/v1/grants/management", get(overview_handler::<S>))
        .route(
            "/api/v1/grants/management/:grant_id",
            get(management_handler::<S>),
        )
        .route(
            "/api/v1/grants/:grant_id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route(
            "/api/v1/grants/:grant_id/activate",
            post(activate_handler::<S>),
        )
        .route(
            "/api/v1/grants/:grant_id/deactivate",
            post(deactivate_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    caller: Caller,
    Json(draft): Json<GrantDraft>,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.create(draft, &caller.audit_name()) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn list_all_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.list_all() {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn list_active_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    _caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    match service.list_active() {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn by_municipality_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    Path(municipality): Path<String>,
    _caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    match service.list_by_municipality(&municipality) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => failure_response(&error),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    Path(grant_id): Path<u64>,
    _caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    match service.get(GrantId(grant_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn update_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    Path(grant_id): Path<u64>,
    caller: Caller,
    Json(draft): Json<GrantDraft>,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.update(GrantId(grant_id), draft) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn delete_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    Path(grant_id): Path<u64>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.delete(GrantId(grant_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn activate_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    Path(grant_id): Path<u64>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.activate(GrantId(grant_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn deactivate_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    Path(grant_id): Path<u64>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.deactivate(GrantId(grant_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn overview_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.management_overview() {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn management_handler<S>(
    State(service): State<Arc<GrantCatalogService<S>>>,
    Path(grant_id): Path<u64>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.management(GrantId(grant_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => failure_response(&error),
    }
}
