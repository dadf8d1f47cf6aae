use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::documents::DocumentKind;
use crate::workflows::grants::domain::{FarmerId, Grant, GrantId, GrantKind};

/// Identifier wrapper for grant applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review state of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Processing,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Processing => "processing",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Farmer details captured with the application at submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantDetails {
    pub farmer_name: String,
    pub farmer_phone: String,
    #[serde(default)]
    pub farmer_email: Option<String>,
    pub farmer_address: String,
    pub farmer_ward: u32,
    pub farmer_municipality: String,
    pub monthly_income: f64,
    pub land_size: f64,
    pub land_size_unit: String,
    #[serde(default)]
    pub has_received_grant_before: bool,
    #[serde(default)]
    pub previous_grant_details: Option<String>,
    pub crop_details: String,
    pub expected_benefits: String,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplicantValidationError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("monthly income must be a finite, non-negative number")]
    InvalidIncome,
    #[error("land size must be a finite number greater than zero")]
    InvalidLandSize,
    #[error("field {field} could not be parsed")]
    UnreadableField { field: &'static str },
    #[error("malformed form body: {0}")]
    MalformedForm(String),
}

fn ensure_present(value: &str, field: &'static str) -> Result<(), ApplicantValidationError> {
    if value.trim().is_empty() {
        Err(ApplicantValidationError::BlankField(field))
    } else {
        Ok(())
    }
}

impl ApplicantDetails {
    pub fn validate(&self) -> Result<(), ApplicantValidationError> {
        ensure_present(&self.farmer_name, "farmer_name")?;
        ensure_present(&self.farmer_phone, "farmer_phone")?;
        ensure_present(&self.farmer_address, "farmer_address")?;
        ensure_present(&self.farmer_municipality, "farmer_municipality")?;
        ensure_present(&self.land_size_unit, "land_size_unit")?;
        ensure_present(&self.crop_details, "crop_details")?;
        ensure_present(&self.expected_benefits, "expected_benefits")?;

        if !self.monthly_income.is_finite() || self.monthly_income < 0.0 {
            return Err(ApplicantValidationError::InvalidIncome);
        }
        if !self.land_size.is_finite() || self.land_size <= 0.0 {
            return Err(ApplicantValidationError::InvalidLandSize);
        }
        Ok(())
    }
}

/// Partial update of the applicant snapshot; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantPatch {
    pub farmer_name: Option<String>,
    pub farmer_phone: Option<String>,
    pub farmer_email: Option<String>,
    pub farmer_address: Option<String>,
    pub farmer_ward: Option<u32>,
    pub farmer_municipality: Option<String>,
    pub monthly_income: Option<f64>,
    pub land_size: Option<f64>,
    pub land_size_unit: Option<String>,
    pub has_received_grant_before: Option<bool>,
    pub previous_grant_details: Option<String>,
    pub crop_details: Option<String>,
    pub expected_benefits: Option<String>,
    pub additional_notes: Option<String>,
}

impl ApplicantPatch {
    pub fn apply_to(self, details: &mut ApplicantDetails) {
        if let Some(value) = self.farmer_name {
            details.farmer_name = value;
        }
        if let Some(value) = self.farmer_phone {
            details.farmer_phone = value;
        }
        if let Some(value) = self.farmer_email {
            details.farmer_email = Some(value);
        }
        if let Some(value) = self.farmer_address {
            details.farmer_address = value;
        }
        if let Some(value) = self.farmer_ward {
            details.farmer_ward = value;
        }
        if let Some(value) = self.farmer_municipality {
            details.farmer_municipality = value;
        }
        if let Some(value) = self.monthly_income {
            details.monthly_income = value;
        }
        if let Some(value) = self.land_size {
            details.land_size = value;
        }
        if let Some(value) = self.land_size_unit {
            details.land_size_unit = value;
        }
        if let Some(value) = self.has_received_grant_before {
            details.has_received_grant_before = value;
        }
        if let Some(value) = self.previous_grant_details {
            details.previous_grant_details = Some(value);
        }
        if let Some(value) = self.crop_details {
            details.crop_details = value;
        }
        if let Some(value) = self.expected_benefits {
            details.expected_benefits = value;
        }
        if let Some(value) = self.additional_notes {
            details.additional_notes = Some(value);
        }
    }
}

/// Public URLs of the stored supporting documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUrls {
    pub citizen_image_url: Option<String>,
    pub land_ownership_url: Option<String>,
    pub land_tax_url: Option<String>,
}

impl DocumentUrls {
    pub fn slot(&self, kind: DocumentKind) -> Option<&str> {
        match kind {
            DocumentKind::CitizenImage => self.citizen_image_url.as_deref(),
            DocumentKind::LandOwnership => self.land_ownership_url.as_deref(),
            DocumentKind::LandTax => self.land_tax_url.as_deref(),
        }
    }

    /// Store a URL in its slot, returning the URL it replaced.
    pub fn replace(&mut self, kind: DocumentKind, url: String) -> Option<String> {
        let slot = match kind {
            DocumentKind::CitizenImage => &mut self.citizen_image_url,
            DocumentKind::LandOwnership => &mut self.land_ownership_url,
            DocumentKind::LandTax => &mut self.land_tax_url,
        };
        slot.replace(url)
    }
}

/// Stored application record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub grant_id: GrantId,
    pub farmer_id: FarmerId,
    pub status: ApplicationStatus,
    #[serde(flatten)]
    pub details: ApplicantDetails,
    #[serde(flatten)]
    pub documents: DocumentUrls,
    pub ai_score: Option<f64>,
    pub admin_remarks: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl Application {
    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            id: self.id,
            farmer_name: self.details.farmer_name.clone(),
            status: self.status,
            ai_score: self.ai_score,
            submitted_at: self.submitted_at,
            admin_remarks: self.admin_remarks.clone(),
        }
    }

    pub fn view(self, grant: Option<&Grant>) -> ApplicationView {
        ApplicationView {
            grant_title: grant.map(|grant| grant.title.clone()),
            grant_kind: grant.map(|grant| grant.kind),
            grant_amount: grant.and_then(|grant| grant.amount),
            grant_object_name: grant.and_then(|grant| grant.object_name.clone()),
            application: self,
        }
    }
}

/// Insert payload; the repository assigns id and initial status.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub grant_id: GrantId,
    pub farmer_id: FarmerId,
    pub details: ApplicantDetails,
    pub documents: DocumentUrls,
    pub submitted_at: DateTime<Utc>,
}

/// Application joined with the headline fields of its grant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub grant_title: Option<String>,
    pub grant_kind: Option<GrantKind>,
    pub grant_amount: Option<f64>,
    pub grant_object_name: Option<String>,
}

/// Compact row used in grant management listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub farmer_name: String,
    pub status: ApplicationStatus,
    pub ai_score: Option<f64>,
    pub submitted_at: DateTime<Utc>,
    pub admin_remarks: Option<String>,
}

/// Selection criteria for repository listings. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub farmer_id: Option<FarmerId>,
    pub grant_id: Option<GrantId>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn for_grant(grant_id: GrantId) -> Self {
        Self {
            grant_id: Some(grant_id),
            ..Self::default()
        }
    }

    pub fn for_farmer(farmer_id: FarmerId) -> Self {
        Self {
            farmer_id: Some(farmer_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, application: &Application) -> bool {
        self.farmer_id
            .as_ref()
            .map_or(true, |farmer| &application.farmer_id == farmer)
            && self
                .grant_id
                .map_or(true, |grant| application.grant_id == grant)
            && self
                .status
                .map_or(true, |status| application.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> ApplicantDetails {
        ApplicantDetails {
            farmer_name: "Sita Tharu".to_string(),
            farmer_phone: "9800000000".to_string(),
            farmer_email: None,
            farmer_address: "Ward 3".to_string(),
            farmer_ward: 3,
            farmer_municipality: "X".to_string(),
            monthly_income: 12000.0,
            land_size: 2.5,
            land_size_unit: "bigha".to_string(),
            has_received_grant_before: false,
            previous_grant_details: None,
            crop_details: "Paddy and lentils".to_string(),
            expected_benefits: "Higher yield".to_string(),
            additional_notes: None,
        }
    }

    #[test]
    fn negative_income_and_zero_land_are_rejected() {
        let mut invalid = details();
        invalid.monthly_income = -1.0;
        assert_eq!(
            invalid.validate(),
            Err(ApplicantValidationError::InvalidIncome)
        );

        let mut invalid = details();
        invalid.land_size = 0.0;
        assert_eq!(
            invalid.validate(),
            Err(ApplicantValidationError::InvalidLandSize)
        );
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut target = details();
        ApplicantPatch {
            crop_details: Some("Wheat".to_string()),
            land_size: Some(4.0),
            ..ApplicantPatch::default()
        }
        .apply_to(&mut target);

        assert_eq!(target.crop_details, "Wheat");
        assert_eq!(target.land_size, 4.0);
        assert_eq!(target.farmer_name, "Sita Tharu");
        assert_eq!(target.expected_benefits, "Higher yield");
    }

    #[test]
    fn replacing_a_document_slot_returns_the_old_url() {
        let mut urls = DocumentUrls::default();
        assert_eq!(
            urls.replace(DocumentKind::LandTax, "/uploads/a".to_string()),
            None
        );
        assert_eq!(
            urls.replace(DocumentKind::LandTax, "/uploads/b".to_string()),
            Some("/uploads/a".to_string())
        );
        assert_eq!(urls.slot(DocumentKind::LandTax), Some("/uploads/b"));
        assert_eq!(urls.slot(DocumentKind::CitizenImage), None);
    }

    #[test]
    fn status_serializes_as_snake_case_label() {
        let json = serde_json::to_string(&ApplicationStatus::Processing).expect("json");
        assert_eq!(json, "\"processing\"");
        assert_eq!(ApplicationStatus::Approved.to_string(), "approved");
    }
}
