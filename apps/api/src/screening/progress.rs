//! Progress Channel contract between the batch pipeline and its caller.
//!
//! Events are pushed in processing order: document N's `processing` event,
//! then its `completed` or `error` event, before any event for document N+1.
//! Each document produces at most two events, none are duplicated, and none
//! are emitted after the batch value is returned. The pipeline invokes the
//! sink synchronously between steps, so sinks must hand off quickly (send on
//! a channel, append to a buffer) rather than block.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Processing,
    Completed,
    Error,
}

/// Incremental status update for one document. Ephemeral: streamed to the
/// caller and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// 1-based index of the document within the batch.
    pub current: usize,
    pub total: usize,
    pub file_name: String,
    pub status: ProgressStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEvent {
    pub fn processing(current: usize, total: usize, file_name: &str) -> Self {
        Self {
            current,
            total,
            file_name: file_name.to_string(),
            status: ProgressStatus::Processing,
            error: None,
        }
    }

    pub fn completed(current: usize, total: usize, file_name: &str) -> Self {
        Self {
            current,
            total,
            file_name: file_name.to_string(),
            status: ProgressStatus::Completed,
            error: None,
        }
    }

    pub fn error(current: usize, total: usize, file_name: &str, error: String) -> Self {
        Self {
            current,
            total,
            file_name: file_name.to_string(),
            status: ProgressStatus::Error,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_casing_matches_the_original_api() {
        let event = ProgressEvent::processing(1, 3, "cv.pdf");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["fileName"], "cv.pdf");
        assert_eq!(json["status"], "processing");
        assert_eq!(json["current"], 1);
        assert_eq!(json["total"], 3);
        // No error key unless one is present.
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_events_carry_the_cause() {
        let event = ProgressEvent::error(2, 3, "cv.pdf", "download failed".to_string());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "download failed");
    }
}
