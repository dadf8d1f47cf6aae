use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{MarketPriceFilter, MarketPriceId, MarketPriceRequest};
use super::repository::MarketPriceRepository;
use super::service::MarketPriceService;
use crate::auth::Caller;
use crate::error::failure_response;

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub crop_name: String,
    pub location: String,
}

/// Router builder for the market price board. Reads are open to any caller.
pub fn market_router<M>(service: Arc<MarketPriceService<M>>) -> Router
where
    M: MarketPriceRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/market-prices",
            post(create_handler::<M>).get(list_all_handler::<M>),
        )
        .route("/api/v1/market-prices/bulk", post(bulk_create_handler::<M>))
        .route("/api/v1/market-prices/active", get(list_active_handler::<M>))
        .route("/api/v1/market-prices/filter", get(filter_handler::<M>))
        .route("/api/v1/market-prices/latest", get(latest_handler::<M>))
        .route("/api/v1/market-prices/crops", get(crops_handler::<M>))
        .route("/api/v1/market-prices/locations", get(locations_handler::<M>))
        .route(
            "/api/v1/market-prices/crop/:crop_name",
            get(by_crop_handler::<M>),
        )
        .route(
            "/api/v1/market-prices/location/:location",
            get(by_location_handler::<M>),
        )
        .route(
            "/api/v1/market-prices/:price_id",
            get(get_handler::<M>)
                .put(update_handler::<M>)
                .delete(delete_handler::<M>),
        )
        .route(
            "/api/v1/market-prices/:price_id/activate",
            post(activate_handler::<M>),
        )
        .route(
            "/api/v1/market-prices/:price_id/deactivate",
            post(deactivate_handler::<M>),
        )
        .with_state(service)
}

async fn create_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    caller: Caller,
    Json(request): Json<MarketPriceRequest>,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.create(request, &caller.audit_name()) {
        Ok(price) => (StatusCode::CREATED, Json(price)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn bulk_create_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    caller: Caller,
    Json(requests): Json<Vec<MarketPriceRequest>>,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.bulk_create(requests, &caller.audit_name()) {
        Ok(prices) => (StatusCode::CREATED, Json(prices)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn list_all_handler<M>(State(service): State<Arc<MarketPriceService<M>>>) -> Response
where
    M: MarketPriceRepository + 'static,
{
    match service.list_all() {
        Ok(prices) => (StatusCode::OK, Json(prices)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn list_active_handler<M>(State(service): State<Arc<MarketPriceService<M>>>) -> Response
where
    M: MarketPriceRepository + 'static,
{
    match service.list_active() {
        Ok(prices) => (StatusCode::OK, Json(prices)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn filter_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    Query(filter): Query<MarketPriceFilter>,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    match service.filter(&filter) {
        Ok(prices) => (StatusCode::OK, Json(prices)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn latest_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    Query(query): Query<LatestQuery>,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    match service.latest(&query.crop_name, &query.location) {
        Ok(price) => (StatusCode::OK, Json(price)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn crops_handler<M>(State(service): State<Arc<MarketPriceService<M>>>) -> Response
where
    M: MarketPriceRepository + 'static,
{
    match service.distinct_crops() {
        Ok(crops) => (StatusCode::OK, Json(crops)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn locations_handler<M>(State(service): State<Arc<MarketPriceService<M>>>) -> Response
where
    M: MarketPriceRepository + 'static,
{
    match service.distinct_locations() {
        Ok(locations) => (StatusCode::OK, Json(locations)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn by_crop_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    Path(crop_name): Path<String>,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    match service.by_crop(&crop_name) {
        Ok(prices) => (StatusCode::OK, Json(prices)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn by_location_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    Path(location): Path<String>,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    match service.by_location(&location) {
        Ok(prices) => (StatusCode::OK, Json(prices)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn get_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    Path(price_id): Path<u64>,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    match service.get(MarketPriceId(price_id)) {
        Ok(price) => (StatusCode::OK, Json(price)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn update_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    Path(price_id): Path<u64>,
    caller: Caller,
    Json(request): Json<MarketPriceRequest>,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.update(MarketPriceId(price_id), request, &caller.audit_name()) {
        Ok(price) => (StatusCode::OK, Json(price)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn delete_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    Path(price_id): Path<u64>,
    caller: Caller,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.delete(MarketPriceId(price_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn activate_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    Path(price_id): Path<u64>,
    caller: Caller,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.activate(MarketPriceId(price_id)) {
        Ok(price) => (StatusCode::OK, Json(price)).into_response(),
        Err(error) => failure_response(&error),
    }
}

async fn deactivate_handler<M>(
    State(service): State<Arc<MarketPriceService<M>>>,
    Path(price_id): Path<u64>,
    caller: Caller,
) -> Response
where
    M: MarketPriceRepository + 'static,
{
    if let Err(rejection) = caller.require_admin() {
        return rejection.into_response();
    }

    match service.deactivate(MarketPriceId(price_id)) {
        Ok(price) => (StatusCode::OK, Json(price)).into_response(),
        Err(error) => failure_response(&error),
    }
}
