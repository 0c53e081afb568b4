//! Axum route handlers for the Screening API.
//!
//! `POST /process` supports two transports over the same pipeline: a buffered
//! JSON response, or, when the client sends `Accept: text/event-stream`, an
//! SSE stream of progress events followed by one terminal frame carrying the
//! batch value.

use std::convert::Infallible;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::UnboundedReceiverStream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::drive::DriveClient;
use crate::errors::AppError;
use crate::screening::pipeline::{
    analyze_one, run_batch, run_batch_streaming, BatchResult, ScreeningResult,
};
use crate::screening::progress::ProgressEvent;
use crate::state::AppState;

/// Upload cap for single-resume analysis.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub job_description: String,
    pub folder_id: String,
    /// Drive access token for this caller; passed through to the store,
    /// never kept in process state.
    pub access_token: String,
}

/// POST /api/v1/screening/process
///
/// Screens every resume in a Drive folder against the job description.
/// Content negotiation picks the transport: SSE when requested, buffered
/// JSON otherwise.
pub async fn handle_process(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ProcessRequest>,
) -> Result<Response, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "jobDescription cannot be empty".to_string(),
        ));
    }
    if request.folder_id.trim().is_empty() {
        return Err(AppError::Validation("folderId cannot be empty".to_string()));
    }
    if request.access_token.trim().is_empty() {
        return Err(AppError::Validation(
            "accessToken cannot be empty".to_string(),
        ));
    }

    let wants_sse = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("text/event-stream"));

    let store = DriveClient::new(state.http.clone(), request.access_token.clone());

    if wants_sse {
        return Ok(process_streaming(state, store, request).into_response());
    }

    let batch = run_batch(
        &store,
        &state.llm,
        &request.job_description,
        &request.folder_id,
        &CancellationToken::new(),
    )
    .await?;

    Ok(Json(batch).into_response())
}

fn process_streaming(
    state: AppState,
    store: DriveClient,
    request: ProcessRequest,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();

    let cancel = CancellationToken::new();
    let progress_tx = tx.clone();
    let progress_cancel = cancel.clone();
    let on_progress = move |event: ProgressEvent| {
        if let Ok(frame) = Event::default().json_data(&event) {
            if progress_tx.send(frame).is_err() {
                // Receiver gone: the client disconnected. Stop the batch at
                // the next document boundary.
                progress_cancel.cancel();
            }
        }
    };

    tokio::spawn(async move {
        let outcome = run_batch_streaming(
            &store,
            &state.llm,
            &request.job_description,
            &request.folder_id,
            &on_progress,
            &cancel,
        )
        .await;

        let terminal = match outcome {
            Ok(batch) => complete_frame(&batch),
            Err(err) => {
                error!("streaming batch failed: {err}");
                serde_json::json!({ "type": "error", "error": err.to_string() })
            }
        };
        if let Ok(frame) = Event::default().json_data(&terminal) {
            let _ = tx.send(frame);
        }
        // Dropping the senders closes the stream.
    });

    Sse::new(UnboundedReceiverStream::new(rx).map(Ok::<Event, Infallible>))
        .keep_alive(KeepAlive::default())
}

/// Terminal SSE frame: the batch value tagged with `"type": "complete"`.
fn complete_frame(batch: &BatchResult) -> serde_json::Value {
    let mut value = serde_json::to_value(batch).unwrap_or_else(|_| serde_json::json!({}));
    if let Some(object) = value.as_object_mut() {
        object.insert("type".to_string(), "complete".into());
    }
    value
}

/// POST /api/v1/screening/analyze
///
/// Analyzes one uploaded resume (multipart: `jobDescription` text field plus
/// a `resume` file field). Failures surface as typed HTTP errors.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScreeningResult>, AppError> {
    let mut job_description = String::new();
    let mut upload: Option<(String, Option<String>, bytes::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart payload: {e}")))?
    {
        match field.name().unwrap_or("") {
            "jobDescription" => {
                job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid jobDescription: {e}")))?;
            }
            "resume" => {
                let file_name = field.file_name().unwrap_or("unknown").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("invalid resume upload: {e}")))?;
                upload = Some((file_name, content_type, data));
            }
            _ => {
                // Drain and ignore unknown fields.
                let _ = field.bytes().await;
            }
        }
    }

    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "jobDescription is required".to_string(),
        ));
    }
    let Some((file_name, content_type, data)) = upload else {
        return Err(AppError::Validation("resume file is required".to_string()));
    };
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "File too large. Maximum size is 10MB".to_string(),
        ));
    }

    let result = analyze_one(
        &state.llm,
        &job_description,
        &data,
        &file_name,
        content_type.as_deref(),
    )
    .await?;

    Ok(Json(result))
}
