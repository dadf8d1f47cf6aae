use std::collections::BTreeMap;
use std::str::FromStr;

use axum::extract::Multipart;

use super::documents::{DocumentKind, DocumentUpload};
use super::domain::{ApplicantDetails, ApplicantPatch, ApplicantValidationError};
use crate::workflows::grants::domain::GrantId;

/// Text fields and document parts of an application form.
#[derive(Debug, Default)]
pub struct ApplicationForm {
    fields: BTreeMap<String, String>,
    pub uploads: Vec<DocumentUpload>,
}

impl ApplicationForm {
    /// Drain a multipart body. File inputs left empty by the browser are skipped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApplicantValidationError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|error| ApplicantValidationError::MalformedForm(error.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(kind) = DocumentKind::from_field(&name) {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|file_name| !file_name.is_empty());
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|error| ApplicantValidationError::MalformedForm(error.body_text()))?;

                if bytes.is_empty() && file_name.is_none() {
                    continue;
                }
                form.uploads.push(DocumentUpload {
                    kind,
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|error| ApplicantValidationError::MalformedForm(error.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            uploads: Vec::new(),
        }
    }

    pub fn grant_id(&self) -> Result<GrantId, ApplicantValidationError> {
        self.parsed::<u64>("grant_id")?
            .map(GrantId)
            .ok_or(ApplicantValidationError::BlankField("grant_id"))
    }

    /// Full applicant snapshot for a new submission.
    pub fn details(&self) -> Result<ApplicantDetails, ApplicantValidationError> {
        Ok(ApplicantDetails {
            farmer_name: self.required("farmer_name")?,
            farmer_phone: self.required("farmer_phone")?,
            farmer_email: self.text("farmer_email"),
            farmer_address: self.required("farmer_address")?,
            farmer_ward: self.required_parsed("farmer_ward")?,
            farmer_municipality: self.required("farmer_municipality")?,
            monthly_income: self.required_parsed("monthly_income")?,
            land_size: self.required_parsed("land_size")?,
            land_size_unit: self.required("land_size_unit")?,
            has_received_grant_before: self.flag("has_received_grant_before")?.unwrap_or(false),
            previous_grant_details: self.text("previous_grant_details"),
            crop_details: self.required("crop_details")?,
            expected_benefits: self.required("expected_benefits")?,
            additional_notes: self.text("additional_notes"),
        })
    }

    /// Only the fields present in the form.
    pub fn patch(&self) -> Result<ApplicantPatch, ApplicantValidationError> {
        Ok(ApplicantPatch {
            farmer_name: self.text("farmer_name"),
            farmer_phone: self.text("farmer_phone"),
            farmer_email: self.text("farmer_email"),
            farmer_address: self.text("farmer_address"),
            farmer_ward: self.parsed("farmer_ward")?,
            farmer_municipality: self.text("farmer_municipality"),
            monthly_income: self.parsed("monthly_income")?,
            land_size: self.parsed("land_size")?,
            land_size_unit: self.text("land_size_unit"),
            has_received_grant_before: self.flag("has_received_grant_before")?,
            previous_grant_details: self.text("previous_grant_details"),
            crop_details: self.text("crop_details"),
            expected_benefits: self.text("expected_benefits"),
            additional_notes: self.text("additional_notes"),
        })
    }

    fn text(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn required(&self, key: &'static str) -> Result<String, ApplicantValidationError> {
        self.text(key)
            .ok_or(ApplicantValidationError::BlankField(key))
    }

    fn parsed<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ApplicantValidationError> {
        self.text(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| ApplicantValidationError::UnreadableField { field: key })
            })
            .transpose()
    }

    fn required_parsed<T: FromStr>(&self, key: &'static str) -> Result<T, ApplicantValidationError> {
        self.parsed(key)?
            .ok_or(ApplicantValidationError::BlankField(key))
    }

    fn flag(&self, key: &'static str) -> Result<Option<bool>, ApplicantValidationError> {
        self.text(key)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ApplicantValidationError::UnreadableField { field: key }),
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> ApplicationForm {
        ApplicationForm::from_fields([
            ("grant_id", "4"),
            ("farmer_name", "Sita Tharu"),
            ("farmer_phone", "9800000000"),
            ("farmer_address", "Ward 3"),
            ("farmer_ward", "3"),
            ("farmer_municipality", "X"),
            ("monthly_income", "12000"),
            ("land_size", "2.5"),
            ("land_size_unit", "bigha"),
            ("has_received_grant_before", "on"),
            ("crop_details", "Paddy"),
            ("expected_benefits", "Higher yield"),
            ("additional_notes", "   "),
        ])
    }

    #[test]
    fn complete_form_builds_applicant_details() {
        let form = complete_form();
        assert_eq!(form.grant_id(), Ok(GrantId(4)));

        let details = form.details().expect("details");
        assert_eq!(details.farmer_ward, 3);
        assert_eq!(details.land_size, 2.5);
        assert!(details.has_received_grant_before);
        assert_eq!(details.additional_notes, None);
        assert_eq!(details.farmer_email, None);
    }

    #[test]
    fn non_numeric_ward_is_unreadable() {
        let mut form = complete_form();
        form.fields
            .insert("farmer_ward".to_string(), "three".to_string());
        assert_eq!(
            form.details(),
            Err(ApplicantValidationError::UnreadableField {
                field: "farmer_ward"
            })
        );
    }

    #[test]
    fn missing_required_field_is_reported_by_name() {
        let mut form = complete_form();
        form.fields.remove("crop_details");
        assert_eq!(
            form.details(),
            Err(ApplicantValidationError::BlankField("crop_details"))
        );
    }

    #[test]
    fn patch_keeps_only_supplied_fields() {
        let form = ApplicationForm::from_fields([("land_size", "4"), ("crop_details", "Wheat")]);
        let patch = form.patch().expect("patch");
        assert_eq!(patch.land_size, Some(4.0));
        assert_eq!(patch.crop_details.as_deref(), Some("Wheat"));
        assert_eq!(patch.farmer_name, None);
        assert_eq!(patch.has_received_grant_before, None);
    }
}
