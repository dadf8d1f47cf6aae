use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantId(pub u64);

impl fmt::Display for GrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a farmer as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FarmerId(pub String);

impl fmt::Display for FarmerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    Money,
    Object,
}

/// One eligible (ward, municipality) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetArea {
    pub ward_number: u32,
    pub municipality: String,
}

impl TargetArea {
    pub fn new(ward_number: u32, municipality: impl Into<String>) -> Self {
        Self {
            ward_number,
            municipality: municipality.into(),
        }
    }
}

/// A stored grant together with the target areas it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub id: GrantId,
    pub title: String,
    pub description: String,
    pub kind: GrantKind,
    pub amount: Option<f64>,
    pub object_name: Option<String>,
    pub photo_url: Option<String>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub target_areas: Vec<TargetArea>,
}

impl Grant {
    /// Overwrite the editable fields with a validated draft.
    pub fn apply(&mut self, draft: ValidatedGrant, now: DateTime<Utc>) {
        self.title = draft.title;
        self.description = draft.description;
        self.kind = draft.kind;
        self.amount = draft.amount;
        self.object_name = draft.object_name;
        self.photo_url = draft.photo_url;
        self.deadline_at = draft.deadline_at;
        self.target_areas = draft.target_areas;
        self.updated_at = Some(now);
    }
}

/// Admin-supplied payload for creating or fully replacing a grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantDraft {
    pub title: String,
    pub description: String,
    pub kind: GrantKind,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub deadline_at: Option<DateTime<Utc>>,
    pub target_wards: Vec<u32>,
    pub target_municipalities: Vec<String>,
}

/// A draft that passed validation, with its target areas expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedGrant {
    pub title: String,
    pub description: String,
    pub kind: GrantKind,
    pub amount: Option<f64>,
    pub object_name: Option<String>,
    pub photo_url: Option<String>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub target_areas: Vec<TargetArea>,
}

/// Insert payload handed to the grant repository, which assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGrant {
    pub grant: ValidatedGrant,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantValidationError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("amount is required for money grants and must be greater than zero")]
    MissingAmount,
    #[error("amount must be a finite, non-negative number")]
    InvalidAmount,
    #[error("object name is required for object grants")]
    MissingObjectName,
    #[error("at least one target ward and one target municipality are required")]
    MissingTargetAreas,
}

fn required(value: String, field: &'static str) -> Result<String, GrantValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(GrantValidationError::BlankField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

impl GrantDraft {
    pub fn validate(self) -> Result<ValidatedGrant, GrantValidationError> {
        let title = required(self.title, "title")?;
        let description = required(self.description, "description")?;
        let object_name = optional(self.object_name);

        match self.kind {
            GrantKind::Money => match self.amount {
                Some(amount) if amount.is_finite() && amount > 0.0 => {}
                _ => return Err(GrantValidationError::MissingAmount),
            },
            GrantKind::Object => {
                if object_name.is_none() {
                    return Err(GrantValidationError::MissingObjectName);
                }
                if let Some(amount) = self.amount {
                    if !amount.is_finite() || amount < 0.0 {
                        return Err(GrantValidationError::InvalidAmount);
                    }
                }
            }
        }

        let municipalities: Vec<String> = self
            .target_municipalities
            .into_iter()
            .map(|municipality| municipality.trim().to_string())
            .collect();
        if municipalities.iter().any(String::is_empty) {
            return Err(GrantValidationError::BlankField("target municipality"));
        }
        if self.target_wards.is_empty() || municipalities.is_empty() {
            return Err(GrantValidationError::MissingTargetAreas);
        }

        Ok(ValidatedGrant {
            title,
            description,
            kind: self.kind,
            amount: self.amount,
            object_name,
            photo_url: optional(self.photo_url),
            deadline_at: self.deadline_at,
            target_areas: expand_target_areas(&self.target_wards, &municipalities),
        })
    }
}

/// Cross product of wards and municipalities, ward-major, without repeats.
pub fn expand_target_areas(wards: &[u32], municipalities: &[String]) -> Vec<TargetArea> {
    let mut areas: Vec<TargetArea> = Vec::with_capacity(wards.len() * municipalities.len());
    for ward in wards {
        for municipality in municipalities {
            let area = TargetArea::new(*ward, municipality.clone());
            if !areas.contains(&area) {
                areas.push(area);
            }
        }
    }
    areas
}

/// Grant as exposed over the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantView {
    #[serde(flatten)]
    pub grant: Grant,
    pub application_count: usize,
}

/// Registered farmer details consumed at application time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerProfile {
    pub farmer_id: FarmerId,
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    pub ward_number: u32,
    pub municipality: String,
}
