//! Wire contracts of the priority and fraud model services.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::grants::applications::Application;

/// Baseline values for model features an application does not capture.
mod baseline {
    pub const CROP_YIELD: &str = "average";
    pub const EDUCATION_LEVEL: &str = "secondary";
    pub const FAMILY_SIZE: u32 = 4;
    pub const AGE: u32 = 35;
    pub const FARMING_EXPERIENCE_YEARS: u32 = 10;
    pub const CREDIT_SCORE: u32 = 500;
    pub const MARKET_DISTANCE_KM: f64 = 5.0;
    pub const SOCIAL_CATEGORY: &str = "general";
}

/// Feature vector sent to the priority model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerFeatures {
    pub farmer_id: String,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub municipality: String,
    pub ward: u32,
    pub monthly_income: f64,
    pub land_size_bigha: f64,
    pub previous_grants: u32,
    pub crop_yield: String,
    pub current_crops: String,
    pub education_level: String,
    pub family_size: u32,
    pub age: u32,
    pub farming_experience_years: u32,
    pub credit_score: u32,
    pub market_distance_km: f64,
    pub has_irrigation: bool,
    pub uses_modern_technology: bool,
    pub social_category: String,
    pub has_disability: bool,
}

impl FarmerFeatures {
    pub fn from_application(application: &Application) -> Self {
        let details = &application.details;
        Self {
            farmer_id: application.farmer_id.0.clone(),
            full_name: details.farmer_name.clone(),
            phone: details.farmer_phone.clone(),
            email: details.farmer_email.clone().unwrap_or_default(),
            address: details.farmer_address.clone(),
            municipality: details.farmer_municipality.clone(),
            ward: details.farmer_ward,
            monthly_income: details.monthly_income,
            land_size_bigha: details.land_size,
            previous_grants: u32::from(details.has_received_grant_before),
            crop_yield: baseline::CROP_YIELD.to_string(),
            current_crops: details.crop_details.clone(),
            education_level: baseline::EDUCATION_LEVEL.to_string(),
            family_size: baseline::FAMILY_SIZE,
            age: baseline::AGE,
            farming_experience_years: baseline::FARMING_EXPERIENCE_YEARS,
            credit_score: baseline::CREDIT_SCORE,
            market_distance_km: baseline::MARKET_DISTANCE_KM,
            has_irrigation: false,
            uses_modern_technology: false,
            social_category: baseline::SOCIAL_CATEGORY.to_string(),
            has_disability: false,
        }
    }
}

/// `POST {priority_url}/predict` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRequest {
    pub farmer_data: FarmerFeatures,
    pub grant_id: String,
}

impl PriorityRequest {
    pub fn for_application(application: &Application) -> Self {
        Self {
            farmer_data: FarmerFeatures::from_application(application),
            grant_id: application.grant_id.to_string(),
        }
    }
}

/// `POST {priority_url}/predict` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityPrediction {
    pub farmer_id: String,
    pub approval_probability: f64,
    pub predicted_status: String,
    pub priority_score: f64,
    pub confidence: f64,
    pub recommendation: String,
    pub reasoning: Vec<String>,
}

/// One application as seen by the fraud model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudCandidate {
    pub farmer_id: String,
    pub farmer_name: String,
    pub monthly_income: f64,
    pub land_size_bigha: f64,
    pub previous_grants: u32,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub municipality: Option<String>,
    pub ward: Option<u32>,
    pub crop_details: Option<String>,
}

impl FraudCandidate {
    pub fn from_application(application: &Application) -> Self {
        let details = &application.details;
        Self {
            farmer_id: application.farmer_id.0.clone(),
            farmer_name: details.farmer_name.clone(),
            monthly_income: details.monthly_income,
            land_size_bigha: details.land_size,
            previous_grants: u32::from(details.has_received_grant_before),
            phone: Some(details.farmer_phone.clone()),
            email: details.farmer_email.clone(),
            municipality: Some(details.farmer_municipality.clone()),
            ward: Some(details.farmer_ward),
            crop_details: Some(details.crop_details.clone()),
        }
    }
}

/// `POST {fraud_url}/detect` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRequest {
    pub applications: Vec<FraudCandidate>,
}

/// Per-application verdict inside a fraud response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub farmer_id: String,
    pub farmer_name: String,
    pub is_fraudulent: bool,
    pub anomaly_score: f64,
    pub risk_level: String,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

/// `POST {fraud_url}/detect` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudReport {
    pub success: bool,
    pub message: String,
    pub total_applications: u32,
    pub fraud_detected: u32,
    pub risk_distribution: BTreeMap<String, u32>,
    pub average_anomaly_score: f64,
    pub results: Vec<FraudAssessment>,
    pub timestamp: String,
}

impl FraudReport {
    pub fn assessment_for(&self, farmer_id: &str) -> Option<&FraudAssessment> {
        self.results
            .iter()
            .find(|assessment| assessment.farmer_id == farmer_id)
    }
}
