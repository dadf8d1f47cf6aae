use crate::cli::ServeArgs;
use crate::infra::{request_body_limit, AppState, Portal};
use crate::routes::with_portal_routes;
use agri_grants::config::AppConfig;
use agri_grants::error::AppError;
use agri_grants::telemetry;
use axum::extract::DefaultBodyLimit;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if args.seed_demo {
        config.seed_demo = true;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let portal = Portal::in_memory(&config)?;
    if config.seed_demo {
        portal.seed_demo()?;
    }

    let app = with_portal_routes(&portal)
        .layer(DefaultBodyLimit::max(request_body_limit(
            config.storage.max_upload_bytes,
        )))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        upload_dir = %config.storage.upload_dir.display(),
        policy = ?config.lifecycle.transition_policy(),
        "agricultural grant portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
