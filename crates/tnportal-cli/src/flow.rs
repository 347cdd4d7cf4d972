//! The three portal steps: upload → review → confirmation.
//!
//! Steps hand data to each other only through URL-encoded page state, so a
//! review can be resumed later from the query string printed by `upload`.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tnportal_client::{ApiClient, UploadError, UploadFile, Uploader};
use tnportal_core::{ExtractionResult, ReviewField, ReviewState, UploadData};

use crate::display;

/// Largest document the portal accepts.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
const MAX_UPLOAD_MB: u64 = MAX_UPLOAD_BYTES / (1024 * 1024);

/// Corrections to the absence period entered on the review step.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct DateEdits {
    /// Corrected first day of absence.
    #[arg(long)]
    pub start: Option<String>,
    /// Corrected last day of absence.
    #[arg(long)]
    pub end: Option<String>,
}

/// Text shown to the participant for a failed upload.
pub fn describe_upload_error(err: &UploadError) -> String {
    if err.status_code() == Some(413) {
        return file_too_large();
    }
    let message = err.to_string();
    if message.trim().is_empty() {
        "Upload failed".to_string()
    } else {
        message
    }
}

fn file_too_large() -> String {
    format!("The file is too large (maximum {MAX_UPLOAD_MB} MB).")
}

pub struct UploadStep<'a> {
    client: &'a ApiClient,
}

impl<'a> UploadStep<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Upload the document and return the review page state.
    pub async fn run(&self, path: &Path) -> anyhow::Result<String> {
        let size = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
            .len();
        if size > MAX_UPLOAD_BYTES {
            anyhow::bail!(file_too_large());
        }
        let file = UploadFile::from_path(path)
            .await
            .map_err(|e| anyhow::anyhow!(describe_upload_error(&e)))?;

        let start = Instant::now();
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Uploading {}...", file.file_name));

        let outcome = Uploader::new(self.client)
            .upload(file, |message| pb.set_message(message.to_string()))
            .await;
        pb.finish_and_clear();

        let result: ExtractionResult =
            outcome.map_err(|e| anyhow::anyhow!(describe_upload_error(&e)))?;
        eprintln!(
            "  Document processed in {:.1}s",
            start.elapsed().as_secs_f64()
        );
        display::print_extraction_notes(&result);

        Ok(review_page_state(&result))
    }
}

/// Page state handed from upload to review; the only thing `upload` prints
/// to stdout.
pub fn review_page_state(result: &ExtractionResult) -> String {
    UploadData::from(result).to_query()
}

pub struct ReviewStep<'a> {
    client: &'a ApiClient,
    state: ReviewState,
}

impl<'a> ReviewStep<'a> {
    /// Open the review page from its page state.
    pub fn new(client: &'a ApiClient, query: &str) -> Self {
        Self {
            client,
            state: ReviewState::new(UploadData::from_query_lenient(query)),
        }
    }

    pub fn apply(&mut self, edits: &DateEdits) -> anyhow::Result<()> {
        if let Some(start) = &edits.start {
            self.state.set(ReviewField::Start, start.clone())?;
        }
        if let Some(end) = &edits.end {
            self.state.set(ReviewField::End, end.clone())?;
        }
        Ok(())
    }

    pub fn show(&self) {
        display::print_review_card(&self.state);
    }

    /// Submit the reviewed values; returns the confirmation page state.
    pub async fn confirm(self) -> anyhow::Result<String> {
        if self.state.is_dirty() {
            tracing::info!("submitting corrected absence period");
        }
        let submission = self.state.into_submission();
        let confirmed = tnportal_client::confirm(self.client, &submission)
            .await
            .context("Confirmation failed")?;
        Ok(confirmed.to_query())
    }
}

/// Render the confirmation page from its page state.
pub fn show_confirmation(query: &str) -> anyhow::Result<()> {
    let data = UploadData::from_query_strict(query)?;
    display::print_confirmation_card(&data);
    Ok(())
}
