use crate::config::ConfigError;
use crate::seed::SeedError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Process-level failures surfaced by the binaries.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Scoring(reqwest::Error),
    Seed(SeedError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Scoring(err) => write!(f, "scoring client error: {}", err),
            AppError::Seed(err) => write!(f, "seed error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Scoring(err) => Some(err),
            AppError::Seed(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::Scoring(value)
    }
}

impl From<SeedError> for AppError {
    fn from(value: SeedError) -> Self {
        Self::Seed(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": "internal",
                "message": self.to_string(),
            }
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Caller-visible classification shared by every domain error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Dependency,
}

impl ErrorCategory {
    pub const fn code(self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Forbidden => "forbidden",
            ErrorCategory::Dependency => "dependency",
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Conflict => StatusCode::CONFLICT,
            ErrorCategory::Forbidden => StatusCode::FORBIDDEN,
            ErrorCategory::Dependency => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Implemented by domain errors so routers can render them uniformly.
pub trait Categorized: fmt::Display {
    fn category(&self) -> ErrorCategory;
}

/// Render a domain error as `{"error": {"code", "message"}}`.
///
/// Dependency failures are logged with their detail and answered with a
/// generic message.
pub fn failure_response<E: Categorized>(error: &E) -> Response {
    let category = error.category();
    let message = match category {
        ErrorCategory::Dependency => {
            tracing::error!(error = %error, "downstream dependency failed");
            "a downstream dependency is unavailable".to_string()
        }
        _ => error.to_string(),
    };

    let body = Json(json!({
        "error": {
            "code": category.code(),
            "message": message,
        }
    }));
    (category.status(), body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Broken(ErrorCategory);

    impl fmt::Display for Broken {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "database password leaked here")
        }
    }

    impl Categorized for Broken {
        fn category(&self) -> ErrorCategory {
            self.0
        }
    }

    #[tokio::test]
    async fn dependency_failures_hide_their_detail() {
        let response = failure_response(&Broken(ErrorCategory::Dependency));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["error"]["code"], "dependency");
        assert!(!payload["error"]["message"]
            .as_str()
            .unwrap_or_default()
            .contains("password"));
    }

    #[tokio::test]
    async fn process_errors_render_as_internal() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["error"]["code"], "internal");
        assert_eq!(payload["error"]["message"], "io error: disk gone");
    }

    #[test]
    fn categories_map_to_http_statuses() {
        assert_eq!(ErrorCategory::Validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCategory::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCategory::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCategory::Forbidden.status(), StatusCode::FORBIDDEN);
    }
}
