use crate::infra::{AppState, Portal};
use agri_grants::scoring::scoring_router;
use agri_grants::workflows::grants::applications::application_router;
use agri_grants::workflows::grants::{farmer_router, grant_router};
use agri_grants::workflows::market::market_router;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;

pub(crate) fn with_portal_routes(portal: &Portal) -> axum::Router {
    grant_router(portal.catalog.clone())
        .merge(farmer_router(portal.farmers.clone()))
        .merge(application_router(
            portal.intake.clone(),
            portal.review.clone(),
        ))
        .merge(market_router(portal.market.clone()))
        .merge(scoring_router(portal.scoring.clone()))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
