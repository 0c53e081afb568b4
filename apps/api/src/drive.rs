//! Google Drive file-store collaborator: listing a folder's resume documents
//! and downloading their raw bytes.
//!
//! The access token is an explicit constructor argument supplied by the
//! caller on every request; this module holds no session state.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// MIME filter for the listing query: only the document types the extractor
/// can decode are ever listed.
const RESUME_MIME_FILTER: &str = "(mimeType='application/pdf' \
    or mimeType='application/vnd.openxmlformats-officedocument.wordprocessingml.document' \
    or mimeType='application/msword')";

const LIST_FIELDS: &str = "files(id, name, mimeType, size, modifiedTime)";

#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not enumerate the folder. Fatal to a batch: no partial results.
    #[error("failed to list files from Google Drive: {0}")]
    Listing(String),

    /// Could not download one document. Scoped to that document only.
    #[error("failed to download file from Google Drive: {0}")]
    Fetch(String),
}

/// One candidate document as listed by the file store. Read-only to the
/// screening core.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDocument {
    pub id: String,
    /// Original filename, e.g. `"John_Smith_Resume.pdf"`.
    pub name: String,
    pub mime_type: String,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub size: Option<i64>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
}

/// Drive reports `size` as a decimal string; accept a bare integer too.
fn deserialize_size<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeField {
        Text(String),
        Number(i64),
    }

    match Option::<SizeField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SizeField::Number(n)) => Ok(Some(n)),
        Some(SizeField::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<CandidateDocument>,
}

/// Remote store of candidate documents.
///
/// The listing order is authoritative: the screening pipeline processes and
/// tie-breaks results in exactly the order returned here.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, folder_id: &str) -> Result<Vec<CandidateDocument>, StoreError>;

    async fn fetch_bytes(&self, document_id: &str) -> Result<Bytes, StoreError>;
}

/// `DocumentStore` backed by the Google Drive v3 REST API.
pub struct DriveClient {
    http: reqwest::Client,
    access_token: String,
}

impl DriveClient {
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        Self { http, access_token }
    }
}

fn listing_query(folder_id: &str) -> String {
    format!("'{folder_id}' in parents and {RESUME_MIME_FILTER} and trashed=false")
}

#[async_trait]
impl DocumentStore for DriveClient {
    async fn list_documents(&self, folder_id: &str) -> Result<Vec<CandidateDocument>, StoreError> {
        let response = self
            .http
            .get(format!("{DRIVE_API_BASE}/files"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", listing_query(folder_id).as_str()),
                ("fields", LIST_FIELDS),
                // Most recently modified first; this ordering is carried
                // through to the final result list for tied scores.
                ("orderBy", "modifiedTime desc"),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Listing(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Listing(format!(
                "Drive API returned {status}: {body}"
            )));
        }

        let listing: FileListResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Listing(e.to_string()))?;

        debug!(
            folder_id,
            count = listing.files.len(),
            "listed candidate documents"
        );
        Ok(listing.files)
    }

    async fn fetch_bytes(&self, document_id: &str) -> Result<Bytes, StoreError> {
        let response = self
            .http
            .get(format!("{DRIVE_API_BASE}/files/{document_id}"))
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Fetch(format!(
                "Drive API returned {status}: {body}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| StoreError::Fetch(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_query_scopes_to_folder_and_known_mime_types() {
        let q = listing_query("folder-123");
        assert!(q.starts_with("'folder-123' in parents"));
        assert!(q.contains("mimeType='application/pdf'"));
        assert!(q.contains("wordprocessingml"));
        assert!(q.contains("mimeType='application/msword'"));
        assert!(q.ends_with("and trashed=false"));
    }

    #[test]
    fn test_listing_deserializes_drive_payload() {
        let payload = r#"{
            "files": [
                {
                    "id": "1abc",
                    "name": "John_Smith_Resume.pdf",
                    "mimeType": "application/pdf",
                    "size": "48213",
                    "modifiedTime": "2024-03-01T12:30:00.000Z"
                },
                {
                    "id": "2def",
                    "name": "cv.docx",
                    "mimeType": "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                }
            ]
        }"#;

        let listing: FileListResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(listing.files.len(), 2);

        let first = &listing.files[0];
        assert_eq!(first.id, "1abc");
        assert_eq!(first.size, Some(48213));
        assert!(first.modified_time.is_some());

        let second = &listing.files[1];
        assert_eq!(second.size, None);
        assert_eq!(second.modified_time, None);
    }

    #[test]
    fn test_size_accepts_bare_integer() {
        let payload = r#"{"id": "x", "name": "a.pdf", "mimeType": "application/pdf", "size": 99}"#;
        let doc: CandidateDocument = serde_json::from_str(payload).unwrap();
        assert_eq!(doc.size, Some(99));
    }

    #[test]
    fn test_empty_listing_deserializes() {
        let listing: FileListResponse = serde_json::from_str("{}").unwrap();
        assert!(listing.files.is_empty());
    }
}
