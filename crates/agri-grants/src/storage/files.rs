use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::debug;

use crate::workflows::grants::applications::{DocumentError, DocumentStore, DocumentUpload};
use crate::workflows::grants::domain::FarmerId;

/// URL prefix under which stored application documents are served.
pub const PUBLIC_PREFIX: &str = "/uploads/applications";

/// Document store writing into `<root>/applications` on the local disk.
#[derive(Debug)]
pub struct LocalDocumentStore {
    directory: PathBuf,
    sequence: AtomicU64,
}

impl LocalDocumentStore {
    pub fn new(upload_root: impl AsRef<Path>) -> Self {
        Self {
            directory: upload_root.as_ref().join("applications"),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_name(&self, owner: &FarmerId, upload: &DocumentUpload) -> String {
        let owner: String = owner
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let stamp = Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .unsigned_abs();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        format!(
            "{}_{}_{}{}{}",
            upload.kind.file_prefix(),
            owner,
            stamp,
            if sequence == 0 {
                String::new()
            } else {
                format!("-{sequence}")
            },
            extension(upload)
        )
    }

    fn local_path(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return None;
        }
        Some(self.directory.join(name))
    }
}

/// Extensions a stored document may carry. Anything else is written without one.
const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];

fn allowed(ext: &str) -> Option<&'static str> {
    ALLOWED_EXTENSIONS
        .into_iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// Extension from the original file name, else from the declared content type.
fn extension(upload: &DocumentUpload) -> String {
    let from_name = upload
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .and_then(allowed);

    let ext = from_name.or_else(|| {
        upload
            .content_type
            .as_deref()
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|extensions| extensions.iter().find_map(|ext| allowed(ext)))
    });

    ext.map(|ext| format!(".{ext}")).unwrap_or_default()
}

impl DocumentStore for LocalDocumentStore {
    fn store(&self, owner: &FarmerId, upload: &DocumentUpload) -> Result<String, DocumentError> {
        fs::create_dir_all(&self.directory).map_err(|error| {
            DocumentError::Storage(format!(
                "cannot create {}: {error}",
                self.directory.display()
            ))
        })?;

        let name = self.file_name(owner, upload);
        let path = self.directory.join(&name);
        fs::write(&path, &upload.bytes).map_err(|error| {
            DocumentError::Storage(format!("cannot write {}: {error}", path.display()))
        })?;

        debug!(path = %path.display(), bytes = upload.bytes.len(), "document stored");
        Ok(format!("{PUBLIC_PREFIX}/{name}"))
    }

    fn remove(&self, url: &str) -> Result<(), DocumentError> {
        let Some(path) = self.local_path(url) else {
            return Ok(());
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(DocumentError::Storage(format!(
                "cannot remove {}: {error}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::grants::applications::DocumentKind;

    fn upload(kind: DocumentKind, file_name: Option<&str>, content_type: Option<&str>) -> DocumentUpload {
        DocumentUpload {
            kind,
            file_name: file_name.map(str::to_string),
            content_type: content_type.map(str::to_string),
            bytes: b"scan".to_vec(),
        }
    }

    #[test]
    fn stores_under_public_prefix_and_removes_again() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = LocalDocumentStore::new(root.path());
        let owner = FarmerId("farmer-7".to_string());

        let url = store
            .store(&owner, &upload(DocumentKind::LandTax, Some("Receipt.PDF"), None))
            .expect("stored");
        assert!(url.starts_with("/uploads/applications/tax_farmer-7_"));
        assert!(url.ends_with(".pdf"));

        let name = url.rsplit('/').next().expect("file name");
        let path = store.directory().join(name);
        assert_eq!(fs::read(&path).expect("written"), b"scan");

        store.remove(&url).expect("removed");
        assert!(!path.exists());
        store.remove(&url).expect("second removal is a no-op");
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        let upload = upload(DocumentKind::CitizenImage, None, Some("image/png"));
        assert_eq!(extension(&upload), ".png");
    }

    #[test]
    fn only_document_extensions_are_kept() {
        let page = upload(DocumentKind::LandTax, Some("receipt.html"), Some("text/html"));
        assert_eq!(extension(&page), "");

        let vector = upload(DocumentKind::CitizenImage, Some("id.svg"), Some("image/svg+xml"));
        assert_eq!(extension(&vector), "");

        let renamed = upload(DocumentKind::CitizenImage, Some("id.html"), Some("image/png"));
        assert_eq!(extension(&renamed), ".png");

        let scan = upload(DocumentKind::LandOwnership, Some("deed.JPEG"), None);
        assert_eq!(extension(&scan), ".jpeg");
    }

    #[test]
    fn scripted_upload_is_stored_without_extension() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = LocalDocumentStore::new(root.path());
        let url = store
            .store(
                &FarmerId("farmer-7".to_string()),
                &upload(DocumentKind::LandTax, Some("x.html"), Some("text/html")),
            )
            .expect("stored");
        let name = url.rsplit('/').next().expect("file name");
        assert!(!name.contains('.'));
    }

    #[test]
    fn names_are_unique_for_rapid_uploads() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = LocalDocumentStore::new(root.path());
        let owner = FarmerId("farmer/../7".to_string());
        let doc = upload(DocumentKind::CitizenImage, Some("id.jpg"), None);

        let first = store.store(&owner, &doc).expect("stored");
        let second = store.store(&owner, &doc).expect("stored");
        assert_ne!(first, second);
        assert!(!first.contains(".."));
    }

    #[test]
    fn urls_outside_the_upload_directory_are_ignored() {
        let root = tempfile::tempdir().expect("tempdir");
        let store = LocalDocumentStore::new(root.path());
        assert_eq!(store.local_path("/uploads/applications/../secret"), None);
        assert_eq!(store.local_path("/etc/passwd"), None);
    }
}
