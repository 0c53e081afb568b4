//! Batch Orchestrator: list the folder, then drive each document through
//! extraction, identity resolution and match analysis, reporting progress and
//! folding per-document failures into the result list.
//!
//! Documents are processed strictly sequentially: at most one scoring call is
//! in flight at any time, which keeps event ordering trivial and avoids
//! bursty traffic against the scoring API. Extension point: extraction is
//! CPU-bound and could run ahead of the scorer, but scoring calls must stay
//! serialized and events must then be re-ordered through an index-preserving
//! completion queue.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::drive::{CandidateDocument, DocumentStore, StoreError};
use crate::llm_client::ScoringModel;
use crate::screening::analyzer::{analyze_match, AnalyzeError, MatchAssessment};
use crate::screening::extractor::{extract_text, ExtractError};
use crate::screening::identity::resolve_candidate_name;
use crate::screening::progress::ProgressEvent;

/// A failure scoped to a single document. Inside a batch these become failed
/// result records; from [`analyze_one`] they propagate to the caller.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Fetch(#[from] StoreError),

    #[error("{0}")]
    Extract(#[from] ExtractError),

    #[error("{0}")]
    Analyze(#[from] AnalyzeError),
}

/// Outcome for one document. Always produced, success or failure, and
/// immutable once created.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningResult {
    pub id: String,
    pub candidate_name: String,
    pub file_name: String,
    pub match_score: u8,
    pub key_skills_matched: Vec<String>,
    pub missing_skills: Vec<String>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    /// Distinguishes a processing failure from a legitimately low score;
    /// failed entries carry a zero score. Always serialized.
    pub failed: bool,
}

impl ScreeningResult {
    fn scored(
        document: &CandidateDocument,
        candidate_name: String,
        assessment: MatchAssessment,
    ) -> Self {
        Self {
            id: document.id.clone(),
            candidate_name,
            file_name: document.name.clone(),
            match_score: assessment.match_score,
            key_skills_matched: assessment.key_skills_matched,
            missing_skills: assessment.missing_skills,
            summary: assessment.summary,
            file_size: document.size,
            modified_time: document.modified_time,
            failed: false,
        }
    }

    fn failed(document: &CandidateDocument, error: &DocumentError) -> Self {
        Self {
            id: document.id.clone(),
            candidate_name: resolve_candidate_name(&document.name, ""),
            file_name: document.name.clone(),
            match_score: 0,
            key_skills_matched: Vec::new(),
            missing_skills: Vec::new(),
            summary: format!("Error processing resume: {error}"),
            file_size: document.size,
            modified_time: document.modified_time,
            failed: true,
        }
    }
}

/// Terminal value of one batch run. `results` is sorted by score descending;
/// tied scores keep their listing order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub results: Vec<ScreeningResult>,
    pub total_processed: usize,
    pub total_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BatchResult {
    fn aggregate(mut results: Vec<ScreeningResult>) -> Self {
        // sort_by is stable: equal scores preserve processing order, so runs
        // over identical inputs are deterministic.
        results.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        let total_errors = results.iter().filter(|r| r.failed).count();
        Self {
            total_processed: results.len(),
            total_errors,
            results,
            message: None,
        }
    }

    fn empty() -> Self {
        Self {
            results: Vec::new(),
            total_processed: 0,
            total_errors: 0,
            message: Some("No resume files found in the folder".to_string()),
        }
    }
}

/// Buffered form: no intermediate events, only the final batch value.
pub async fn run_batch(
    store: &dyn DocumentStore,
    model: &dyn ScoringModel,
    job_description: &str,
    folder_id: &str,
    cancel: &CancellationToken,
) -> Result<BatchResult, StoreError> {
    run_batch_streaming(
        store,
        model,
        job_description,
        folder_id,
        &|_: ProgressEvent| {},
        cancel,
    )
    .await
}

/// Streaming form: `on_progress` is invoked synchronously, in processing
/// order, before each document's outcome is committed to the result list.
///
/// Only a listing failure is fatal. Every other failure is recorded as a
/// failed result for its document, so the returned list always has one entry
/// per listed document. Cancellation is observed at document boundaries; the
/// partial batch accumulated so far is returned.
pub async fn run_batch_streaming(
    store: &dyn DocumentStore,
    model: &dyn ScoringModel,
    job_description: &str,
    folder_id: &str,
    on_progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    cancel: &CancellationToken,
) -> Result<BatchResult, StoreError> {
    let documents = store.list_documents(folder_id).await?;
    if documents.is_empty() {
        info!(folder_id, "no candidate documents listed");
        return Ok(BatchResult::empty());
    }

    let total = documents.len();
    info!(folder_id, total, "screening batch started");

    let mut results = Vec::with_capacity(total);
    for (index, document) in documents.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(
                processed = results.len(),
                total, "batch cancelled at document boundary"
            );
            break;
        }

        let current = index + 1;
        on_progress(ProgressEvent::processing(current, total, &document.name));

        match process_document(store, model, job_description, document).await {
            Ok(result) => {
                on_progress(ProgressEvent::completed(current, total, &document.name));
                results.push(result);
            }
            Err(err) => {
                error!(file = %document.name, "error processing document: {err}");
                on_progress(ProgressEvent::error(
                    current,
                    total,
                    &document.name,
                    err.to_string(),
                ));
                results.push(ScreeningResult::failed(document, &err));
            }
        }
    }

    let batch = BatchResult::aggregate(results);
    info!(
        total_processed = batch.total_processed,
        total_errors = batch.total_errors,
        "screening batch finished"
    );
    Ok(batch)
}

async fn process_document(
    store: &dyn DocumentStore,
    model: &dyn ScoringModel,
    job_description: &str,
    document: &CandidateDocument,
) -> Result<ScreeningResult, DocumentError> {
    let data = store.fetch_bytes(&document.id).await?;
    let text = extract_text(&data, Some(&document.mime_type), &document.name)?;
    let candidate_name = resolve_candidate_name(&document.name, &text);
    let assessment = analyze_match(model, job_description, &text, &candidate_name).await?;
    Ok(ScreeningResult::scored(document, candidate_name, assessment))
}

/// Ad hoc single-document analysis, bypassing the file store. There is no
/// batch to absorb a failure here, so errors propagate to the caller.
pub async fn analyze_one(
    model: &dyn ScoringModel,
    job_description: &str,
    data: &[u8],
    filename: &str,
    mime_type: Option<&str>,
) -> Result<ScreeningResult, DocumentError> {
    let text = extract_text(data, mime_type, filename)?;
    let candidate_name = resolve_candidate_name(filename, &text);
    let assessment = analyze_match(model, job_description, &text, &candidate_name).await?;

    Ok(ScreeningResult {
        id: Uuid::new_v4().to_string(),
        candidate_name,
        file_name: filename.to_string(),
        match_score: assessment.match_score,
        key_skills_matched: assessment.key_skills_matched,
        missing_skills: assessment.missing_skills,
        summary: assessment.summary,
        file_size: Some(data.len() as i64),
        modified_time: None,
        failed: false,
    })
}
