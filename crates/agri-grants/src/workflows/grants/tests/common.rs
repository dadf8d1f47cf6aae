use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{Duration, Utc};
use serde_json::Value;

use crate::auth::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::storage::{MemoryStore, RepositoryError};
use crate::workflows::grants::applications::{
    ApplicantDetails, Application, ApplicationId, ApplicationRepository, ApplicationStatus,
    DocumentUrls, NewApplication,
};
use crate::workflows::grants::catalog::GrantCatalogService;
use crate::workflows::grants::domain::{FarmerId, GrantDraft, GrantId, GrantKind};

pub(super) fn money_draft(title: &str, wards: &[u32], municipalities: &[&str]) -> GrantDraft {
    GrantDraft {
        title: title.to_string(),
        description: "Support for the upcoming planting season".to_string(),
        kind: GrantKind::Money,
        amount: Some(15000.0),
        object_name: None,
        photo_url: None,
        deadline_at: Some(Utc::now() + Duration::days(30)),
        target_wards: wards.to_vec(),
        target_municipalities: municipalities.iter().map(|m| m.to_string()).collect(),
    }
}

pub(super) fn object_draft(title: &str) -> GrantDraft {
    GrantDraft {
        kind: GrantKind::Object,
        amount: None,
        object_name: Some("Power tiller".to_string()),
        ..money_draft(title, &[1], &["Bharatpur"])
    }
}

pub(super) fn build_catalog() -> (GrantCatalogService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (GrantCatalogService::new(store.clone()), store)
}

fn details(farmer: &str) -> ApplicantDetails {
    ApplicantDetails {
        farmer_name: format!("Farmer {farmer}"),
        farmer_phone: "9800000000".to_string(),
        farmer_email: None,
        farmer_address: "Ward 3, Bharatpur".to_string(),
        farmer_ward: 3,
        farmer_municipality: "Bharatpur".to_string(),
        monthly_income: 18000.0,
        land_size: 1.5,
        land_size_unit: "bigha".to_string(),
        has_received_grant_before: false,
        previous_grant_details: None,
        crop_details: "Paddy and mustard".to_string(),
        expected_benefits: "Better irrigation".to_string(),
        additional_notes: None,
    }
}

/// Insert an application directly, bypassing intake rules.
pub(super) fn file_application(store: &MemoryStore, grant_id: GrantId, farmer: &str) -> Application {
    store
        .insert_application(NewApplication {
            grant_id,
            farmer_id: FarmerId(farmer.to_string()),
            details: details(farmer),
            documents: DocumentUrls::default(),
            submitted_at: Utc::now(),
        })
        .expect("application stored")
}

pub(super) fn set_status(store: &MemoryStore, id: ApplicationId, status: ApplicationStatus) {
    store
        .modify_applications(&[id], |application| {
            application.status = status;
            Ok::<(), RepositoryError>(())
        })
        .expect("status set");
}

pub(super) fn request(method: Method, uri: &str, role: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder
            .header(USER_ID_HEADER, format!("{role}-1"))
            .header(USER_ROLE_HEADER, role);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).expect("json body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
