use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use super::client::ScoringClient;
use super::service::ScoringService;
use crate::auth::Caller;
use crate::error::failure_response;
use crate::workflows::grants::applications::{ApplicationId, ApplicationRepository};
use crate::workflows::grants::repository::GrantRepository;

/// Router builder for model-backed application endpoints.
pub fn scoring_router<S, C>(service: Arc<ScoringService<S, C>>) -> Router
where
    S: GrantRepository + ApplicationRepository + 'static,
    C: ScoringClient + 'static,
{
    Router::new()
        .route(
            "/api/v1/applications/:application_id/score",
            post(score_handler::<S, C>),
        )
        .route(
            "/api/v1/applications/:application_id/insights",
            get(insights_handler::<S, C>),
        )
        .with_state(service)
}

async fn score_handler<S, C>(
    State(service): State<Arc<ScoringService<S, C>>>,
    Path(application_id): Path<u64>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
    C: ScoringClient + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.score(ApplicationId(application_id)).await {
        Ok(scored) => (StatusCode::OK, Json(scored)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn insights_handler<S, C>(
    State(service): State<Arc<ScoringService<S, C>>>,
    Path(application_id): Path<u64>,
    caller: Caller,
) -> Response
where
    S: GrantRepository + ApplicationRepository + 'static,
    C: ScoringClient + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.insights(ApplicationId(application_id)).await {
        Ok(insights) => (StatusCode::OK, Json(insights)).into_response(),
        Err(error) => failure_response(&error),
    }
}
