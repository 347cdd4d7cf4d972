//! Upload one document and turn the event stream into an [`ExtractionResult`].

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;
use tnportal_core::ExtractionResult;
use tracing::{info, warn};

use crate::transport::{ApiClient, SseEvent, TransportError};

pub const UPLOAD_PATH: &str = "/tn-document/upload";

const EVENT_STATUS: &str = "status";
const EVENT_SUCCESS: &str = "success";
const EVENT_ERROR: &str = "error";

const GENERIC_FAILURE: &str = "Document processing failed";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The backend sent an `error` event.
    #[error("{0}")]
    Rejected(String),
    #[error("No extraction data received from server")]
    InvalidResult,
    #[error("extraction result could not be decoded: {0}")]
    MalformedResult(#[source] serde_json::Error),
    #[error("could not read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            UploadError::Transport(err) => err.status_code(),
            _ => None,
        }
    }
}

/// A document selected for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::ReadFile {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(file_name, content_type, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Opaque per-upload token expected by the backend.
pub fn generate_identifier() -> String {
    format!("upload-{}", chrono::Utc::now().timestamp_millis())
}

/// Pick the extraction result out of a `success` payload or the final
/// stream payload.
///
/// Shapes are tried in order and the first match wins:
/// 1. `result` is a string holding JSON, parsed again;
/// 2. `result` is an object, used as is;
/// 3. the payload itself has `extractions`.
///
/// `Ok(None)` means no shape matched.
pub fn select_result(payload: &Value) -> Result<Option<Value>, serde_json::Error> {
    match payload.get("result") {
        Some(Value::String(raw)) => {
            serde_json::from_str(raw).map(|v: Value| (!v.is_null()).then_some(v))
        }
        Some(result @ Value::Object(_)) => Ok(Some(result.clone())),
        _ if ExtractionResult::has_extractions_block(payload) => Ok(Some(payload.clone())),
        _ => Ok(None),
    }
}

/// Message carried by a `status` event, if any.
fn status_message(data: &Value) -> Option<&str> {
    data.get("message").and_then(Value::as_str)
}

fn error_message(data: &Value) -> String {
    data.get("error")
        .and_then(Value::as_str)
        .or_else(|| data.get("message").and_then(Value::as_str))
        .unwrap_or(GENERIC_FAILURE)
        .to_string()
}

/// What the event handler has gathered so far for one upload.
#[derive(Debug, Default)]
struct StreamOutcome {
    result: Option<Value>,
    error: Option<String>,
}

impl StreamOutcome {
    fn observe(&mut self, event: &SseEvent, on_status: &mut impl FnMut(&str)) {
        match event.event.as_str() {
            EVENT_STATUS => {
                if let Some(message) = status_message(&event.data) {
                    on_status(message);
                }
            }
            EVENT_SUCCESS => match select_result(&event.data) {
                Ok(Some(result)) => self.result = Some(result),
                Ok(None) => warn!("success event without a recognisable result"),
                Err(err) => warn!(error = %err, "ignoring success event with malformed result"),
            },
            EVENT_ERROR => {
                let message = error_message(&event.data);
                warn!(error = %message, "backend reported a processing error");
                self.error = Some(message);
            }
            other => tracing::debug!(event = other, "ignoring unhandled event"),
        }
    }
}

/// Drives a single document through the upload endpoint.
pub struct Uploader<'a> {
    client: &'a ApiClient,
}

impl<'a> Uploader<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Upload `file` and wait for the extraction.
    ///
    /// `on_status` receives the human-readable progress messages. An `error`
    /// event fails the upload once the stream has ended, even if a `success`
    /// event arrived too. Transport failures are returned unchanged.
    pub async fn upload(
        &self,
        file: UploadFile,
        mut on_status: impl FnMut(&str),
    ) -> Result<ExtractionResult, UploadError> {
        let identifier = generate_identifier();
        info!(
            file = %file.file_name,
            bytes = file.len(),
            identifier = %identifier,
            "uploading document"
        );

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(TransportError::Network)?;
        let form = Form::new().part("file", part).text("identifier", identifier);

        let mut outcome = StreamOutcome::default();
        let response: Value = self
            .client
            .post_form_data_with_events(UPLOAD_PATH, form, |event| {
                outcome.observe(event, &mut on_status)
            })
            .await?;

        if let Some(message) = outcome.error {
            return Err(UploadError::Rejected(message));
        }

        let result = match outcome.result {
            Some(result) => Some(result),
            None => select_result(&response).map_err(UploadError::MalformedResult)?,
        };

        let Some(result) = result.filter(ExtractionResult::has_extractions_block) else {
            return Err(UploadError::InvalidResult);
        };

        let result: ExtractionResult =
            serde_json::from_value(result).map_err(UploadError::MalformedResult)?;
        info!(
            processing_id = %result.processing_id,
            document_type = %result.extractions.document_type,
            "extraction received"
        );
        Ok(result)
    }
}
