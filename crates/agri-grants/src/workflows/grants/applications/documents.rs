use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflows::grants::domain::FarmerId;

/// Supporting document slots accepted with an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    CitizenImage,
    LandOwnership,
    LandTax,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::CitizenImage,
        DocumentKind::LandOwnership,
        DocumentKind::LandTax,
    ];

    /// Multipart field name carrying this document.
    pub fn field_name(self) -> &'static str {
        match self {
            DocumentKind::CitizenImage => "citizen_image",
            DocumentKind::LandOwnership => "land_ownership",
            DocumentKind::LandTax => "land_tax",
        }
    }

    /// Prefix used when naming stored files.
    pub fn file_prefix(self) -> &'static str {
        match self {
            DocumentKind::CitizenImage => "citizen",
            DocumentKind::LandOwnership => "land",
            DocumentKind::LandTax => "tax",
        }
    }

    pub fn from_field(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.field_name() == name)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A document received with a request, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub kind: DocumentKind,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Per-document size cap applied before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_bytes: usize,
}

impl UploadLimits {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn check(&self, uploads: &[DocumentUpload]) -> Result<(), DocumentError> {
        let mut seen: Vec<DocumentKind> = Vec::with_capacity(uploads.len());
        for upload in uploads {
            if seen.contains(&upload.kind) {
                return Err(DocumentError::Duplicate { kind: upload.kind });
            }
            seen.push(upload.kind);

            if upload.bytes.is_empty() {
                return Err(DocumentError::Empty { kind: upload.kind });
            }
            if upload.bytes.len() > self.max_bytes {
                return Err(DocumentError::TooLarge {
                    kind: upload.kind,
                    size: upload.bytes.len(),
                    limit: self.max_bytes,
                });
            }
        }
        Ok(())
    }
}

/// Blob storage for application documents.
pub trait DocumentStore: Send + Sync {
    /// Persist the upload and return the public URL it is served under.
    fn store(&self, owner: &FarmerId, upload: &DocumentUpload) -> Result<String, DocumentError>;
    /// Remove a previously stored document. Unknown URLs are not an error.
    fn remove(&self, url: &str) -> Result<(), DocumentError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("{kind} document is empty")]
    Empty { kind: DocumentKind },
    #[error("{kind} document is {size} bytes, above the {limit} byte limit")]
    TooLarge {
        kind: DocumentKind,
        size: usize,
        limit: usize,
    },
    #[error("{kind} document was supplied more than once")]
    Duplicate { kind: DocumentKind },
    #[error("document storage failed: {0}")]
    Storage(String),
}

impl DocumentError {
    pub fn is_rejection(&self) -> bool {
        !matches!(self, DocumentError::Storage(_))
    }
}
