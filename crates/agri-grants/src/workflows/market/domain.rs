use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketPriceId(pub u64);

impl fmt::Display for MarketPriceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Published market price of a crop at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPrice {
    pub id: MarketPriceId,
    pub crop_name: String,
    pub price: f64,
    pub unit: String,
    pub location: String,
    pub crop_photo: Option<String>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Admin payload for creating or replacing a price entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPriceRequest {
    pub crop_name: String,
    pub price: f64,
    pub unit: String,
    pub location: String,
    #[serde(default)]
    pub crop_photo: Option<String>,
}

/// Insert payload; the repository assigns the id and marks it active.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMarketPrice {
    pub crop_name: String,
    pub price: f64,
    pub unit: String,
    pub location: String,
    pub crop_photo: Option<String>,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceValidationError {
    #[error("{0} must not be blank")]
    BlankField(&'static str),
    #[error("price must be a finite number greater than zero")]
    InvalidPrice,
}

fn required(value: &str, field: &'static str) -> Result<String, PriceValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(PriceValidationError::BlankField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

impl MarketPriceRequest {
    pub fn validate(
        &self,
        updated_by: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<NewMarketPrice, PriceValidationError> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(PriceValidationError::InvalidPrice);
        }

        Ok(NewMarketPrice {
            crop_name: required(&self.crop_name, "crop_name")?,
            price: self.price,
            unit: required(&self.unit, "unit")?,
            location: required(&self.location, "location")?,
            crop_photo: self
                .crop_photo
                .as_deref()
                .map(str::trim)
                .filter(|photo| !photo.is_empty())
                .map(str::to_string),
            updated_by: updated_by.to_string(),
            updated_at,
        })
    }
}

/// Query-string filter; every criterion is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketPriceFilter {
    pub crop_name: Option<String>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl MarketPriceFilter {
    pub fn matches(&self, price: &MarketPrice) -> bool {
        self.crop_name
            .as_deref()
            .map_or(true, |crop| contains_ignore_case(&price.crop_name, crop))
            && self
                .location
                .as_deref()
                .map_or(true, |location| contains_ignore_case(&price.location, location))
            && self
                .is_active
                .map_or(true, |active| price.is_active == active)
            && self.from.map_or(true, |from| price.updated_at >= from)
            && self.to.map_or(true, |to| price.updated_at <= to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> MarketPriceRequest {
        MarketPriceRequest {
            crop_name: " Tomato ".to_string(),
            price: 80.0,
            unit: "kg".to_string(),
            location: "Kalimati".to_string(),
            crop_photo: None,
        }
    }

    #[test]
    fn non_positive_prices_are_rejected() {
        for price in [0.0, -5.0, f64::INFINITY] {
            let mut invalid = request();
            invalid.price = price;
            assert_eq!(
                invalid.validate("admin", Utc::now()),
                Err(PriceValidationError::InvalidPrice)
            );
        }
    }

    #[test]
    fn filter_matches_substrings_without_case() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("date");
        let entry = request().validate("admin", at).expect("valid");
        let price = MarketPrice {
            id: MarketPriceId(1),
            crop_name: entry.crop_name,
            price: entry.price,
            unit: entry.unit,
            location: entry.location,
            crop_photo: None,
            updated_by: entry.updated_by,
            updated_at: at,
            is_active: true,
        };

        let filter = MarketPriceFilter {
            crop_name: Some("tom".to_string()),
            location: Some("KALI".to_string()),
            ..MarketPriceFilter::default()
        };
        assert!(filter.matches(&price));

        let later = MarketPriceFilter {
            from: Some(at + chrono::Duration::days(1)),
            ..MarketPriceFilter::default()
        };
        assert!(!later.matches(&price));
    }
}
