use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::auth::{USER_ID_HEADER, USER_NAME_HEADER, USER_ROLE_HEADER};
use crate::storage::MemoryStore;
use crate::workflows::grants::applications::{
    application_router, ApplicantDetails, Application, ApplicationIntakeService,
    ApplicationReviewService, DocumentError, DocumentKind, DocumentStore, DocumentUpload,
    TransitionPolicy, UploadLimits,
};
use crate::workflows::grants::domain::{
    FarmerId, FarmerProfile, Grant, GrantKind, NewGrant, TargetArea, ValidatedGrant,
};
use crate::workflows::grants::repository::{FarmerDirectory, GrantRepository};

pub(super) const MAX_UPLOAD: usize = 1024;
pub(super) const BOUNDARY: &str = "agri-grants-boundary";

type StoreHook = Box<dyn Fn() + Send + Sync>;

/// Document store keeping blobs in memory so tests can see what was left behind.
#[derive(Default)]
pub(super) struct MemoryDocuments {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    sequence: AtomicUsize,
    fail_on_store: Option<usize>,
    before_store: Mutex<Option<StoreHook>>,
}

impl MemoryDocuments {
    /// Fails the `n`th store call (zero based) with a storage error.
    pub(super) fn failing_on(n: usize) -> Self {
        Self {
            fail_on_store: Some(n),
            ..Self::default()
        }
    }

    /// Run `hook` at the start of every store call, as a concurrent request would.
    pub(super) fn before_store(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.before_store.lock().expect("hook mutex poisoned") = Some(Box::new(hook));
    }

    pub(super) fn urls(&self) -> Vec<String> {
        self.blobs
            .lock()
            .expect("document mutex poisoned")
            .keys()
            .cloned()
            .collect()
    }

    pub(super) fn contains(&self, url: &str) -> bool {
        self.blobs
            .lock()
            .expect("document mutex poisoned")
            .contains_key(url)
    }
}

impl DocumentStore for MemoryDocuments {
    fn store(&self, owner: &FarmerId, upload: &DocumentUpload) -> Result<String, DocumentError> {
        if let Some(hook) = self.before_store.lock().expect("hook mutex poisoned").as_ref() {
            hook();
        }
        let n = self.sequence.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_store == Some(n) {
            return Err(DocumentError::Storage("disk full".to_string()));
        }
        let url = format!(
            "/uploads/applications/{}_{}_{n}.jpg",
            upload.kind.file_prefix(),
            owner
        );
        self.blobs
            .lock()
            .expect("document mutex poisoned")
            .insert(url.clone(), upload.bytes.clone());
        Ok(url)
    }

    fn remove(&self, url: &str) -> Result<(), DocumentError> {
        self.blobs
            .lock()
            .expect("document mutex poisoned")
            .remove(url);
        Ok(())
    }
}

pub(super) struct Fixture {
    pub(super) store: Arc<MemoryStore>,
    pub(super) documents: Arc<MemoryDocuments>,
    pub(super) intake: Arc<ApplicationIntakeService<MemoryStore, MemoryDocuments>>,
    pub(super) review: Arc<ApplicationReviewService<MemoryStore>>,
}

impl Fixture {
    pub(super) fn new(policy: TransitionPolicy) -> Self {
        Self::with_documents(policy, MemoryDocuments::default())
    }

    pub(super) fn with_documents(policy: TransitionPolicy, documents: MemoryDocuments) -> Self {
        let store = Arc::new(MemoryStore::new());
        let documents = Arc::new(documents);
        let intake = Arc::new(ApplicationIntakeService::new(
            store.clone(),
            documents.clone(),
            UploadLimits::new(MAX_UPLOAD),
        ));
        let review = Arc::new(ApplicationReviewService::new(store.clone(), policy));
        Self {
            store,
            documents,
            intake,
            review,
        }
    }

    pub(super) fn router(&self) -> axum::Router {
        application_router(self.intake.clone(), self.review.clone())
    }

    /// Money grant targeting wards 3 and 4 of municipality "X".
    pub(super) fn grant(&self) -> Grant {
        self.grant_for(&[3, 4], "X")
    }

    pub(super) fn grant_for(&self, wards: &[u32], municipality: &str) -> Grant {
        self.store
            .insert_grant(NewGrant {
                grant: ValidatedGrant {
                    title: "Irrigation support".to_string(),
                    description: "Pumps and pipes".to_string(),
                    kind: GrantKind::Money,
                    amount: Some(25000.0),
                    object_name: None,
                    photo_url: None,
                    deadline_at: None,
                    target_areas: wards
                        .iter()
                        .map(|ward| TargetArea::new(*ward, municipality))
                        .collect(),
                },
                created_by: "admin".to_string(),
                created_at: Utc::now(),
            })
            .expect("grant stored")
    }

    pub(super) fn farmer(&self, id: &str, ward: u32, municipality: &str) -> FarmerId {
        let farmer_id = FarmerId(id.to_string());
        self.store
            .upsert_farmer(FarmerProfile {
                farmer_id: farmer_id.clone(),
                full_name: format!("Farmer {id}"),
                phone: "9800000000".to_string(),
                email: None,
                address: format!("Ward {ward}"),
                ward_number: ward,
                municipality: municipality.to_string(),
            })
            .expect("profile stored");
        farmer_id
    }

    /// Submit a clean application for `farmer` against `grant`.
    pub(super) fn submitted(&self, grant: &Grant, farmer: &FarmerId) -> Application {
        self.intake
            .submit(grant.id, farmer, details(), Vec::new())
            .expect("application submitted")
    }
}

pub(super) fn details() -> ApplicantDetails {
    ApplicantDetails {
        farmer_name: "Sita Tharu".to_string(),
        farmer_phone: "9800000000".to_string(),
        farmer_email: Some("sita@example.org".to_string()),
        farmer_address: "Ward 3, X".to_string(),
        farmer_ward: 3,
        farmer_municipality: "X".to_string(),
        monthly_income: 12000.0,
        land_size: 2.0,
        land_size_unit: "bigha".to_string(),
        has_received_grant_before: false,
        previous_grant_details: None,
        crop_details: "Paddy".to_string(),
        expected_benefits: "Second harvest".to_string(),
        additional_notes: None,
    }
}

pub(super) fn upload(kind: DocumentKind, size: usize) -> DocumentUpload {
    DocumentUpload {
        kind,
        file_name: Some(format!("{}.jpg", kind.field_name())),
        content_type: Some("image/jpeg".to_string()),
        bytes: vec![0xAB; size],
    }
}

/// Text fields of a complete application form.
pub(super) fn form_fields(grant: &Grant) -> Vec<(&'static str, String)> {
    vec![
        ("grant_id", grant.id.to_string()),
        ("farmer_name", "Sita Tharu".to_string()),
        ("farmer_phone", "9800000000".to_string()),
        ("farmer_address", "Ward 3, X".to_string()),
        ("farmer_ward", "3".to_string()),
        ("farmer_municipality", "X".to_string()),
        ("monthly_income", "12000".to_string()),
        ("land_size", "2".to_string()),
        ("land_size_unit", "bigha".to_string()),
        ("has_received_grant_before", "false".to_string()),
        ("crop_details", "Paddy".to_string()),
        ("expected_benefits", "Second harvest".to_string()),
    ]
}

/// Encode text fields and `(field, file name, bytes)` parts as multipart/form-data.
pub(super) fn multipart_body(fields: &[(&str, String)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn with_identity(
    builder: axum::http::request::Builder,
    identity: Option<(&str, &str)>,
) -> axum::http::request::Builder {
    match identity {
        Some((role, user_id)) => builder
            .header(USER_ID_HEADER, user_id)
            .header(USER_ROLE_HEADER, role)
            .header(USER_NAME_HEADER, format!("{role} {user_id}")),
        None => builder,
    }
}

pub(super) fn multipart_request(
    method: Method,
    uri: &str,
    identity: Option<(&str, &str)>,
    body: Vec<u8>,
) -> Request<Body> {
    with_identity(Request::builder().method(method).uri(uri), identity)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

pub(super) fn json_request(
    method: Method,
    uri: &str,
    identity: Option<(&str, &str)>,
    body: Option<Value>,
) -> Request<Body> {
    let builder = with_identity(Request::builder().method(method).uri(uri), identity);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).expect("json body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
