//! Caller identity as asserted by the upstream identity provider.
//!
//! Token issuance and verification happen before requests reach this
//! service; handlers only read the resulting identity headers.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::workflows::grants::domain::FarmerId;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_NAME_HEADER: &str = "x-user-name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Farmer,
    Admin,
}

impl Role {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "farmer" => Some(Self::Farmer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Authenticated caller extracted from request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
    pub display_name: Option<String>,
}

impl Caller {
    pub fn require_admin(&self) -> Result<(), AuthRejection> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Farmer => Err(AuthRejection::WrongRole {
                required: Role::Admin,
            }),
        }
    }

    pub fn require_farmer(&self) -> Result<FarmerId, AuthRejection> {
        match self.role {
            Role::Farmer => Ok(FarmerId(self.user_id.clone())),
            Role::Admin => Err(AuthRejection::WrongRole {
                required: Role::Farmer,
            }),
        }
    }

    /// Name recorded in audit fields such as `updated_by`.
    pub fn audit_name(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.user_id.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    #[error("missing caller identity")]
    Missing,
    #[error("unrecognised caller role")]
    UnknownRole,
    #[error("this operation requires the {required:?} role")]
    WrongRole { required: Role },
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AuthRejection::Missing | AuthRejection::UnknownRole => {
                (StatusCode::UNAUTHORIZED, "unauthenticated")
            }
            AuthRejection::WrongRole { .. } => (StatusCode::FORBIDDEN, "forbidden"),
        };
        let body = Json(json!({
            "error": { "code": code, "message": self.to_string() }
        }));
        (status, body).into_response()
    }
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER).ok_or(AuthRejection::Missing)?;
        let role = header_value(parts, USER_ROLE_HEADER).ok_or(AuthRejection::Missing)?;
        let role = Role::parse(&role).ok_or(AuthRejection::UnknownRole)?;

        Ok(Caller {
            user_id,
            role,
            display_name: header_value(parts, USER_NAME_HEADER),
        })
    }
}
