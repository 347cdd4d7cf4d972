//! Document extraction types returned by the processing backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Link from an extracted value back to a region of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BboxRef {
    pub page_num: u32,
    pub bbox_id: u32,
}

/// One value pulled from the uploaded document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionField {
    /// Set when the extractor thinks the value is probably wrong.
    pub validation_problem: bool,
    pub note: String,
    /// Opaque extractor score. The backend does not document a range.
    pub confidence: f64,
    pub bbox_refs: Vec<BboxRef>,
    pub value: String,
}

/// The `extractions` block of an [`ExtractionResult`].
///
/// Every business field may be `null` or missing on the wire; both mean
/// "nothing extracted".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Extractions {
    pub schema_version: Option<u32>,
    pub document_type: String,
    #[serde(rename = "vorname")]
    pub first_name: Option<ExtractionField>,
    #[serde(rename = "familienname")]
    pub last_name: Option<ExtractionField>,
    #[serde(rename = "krankenstandsadresse")]
    pub absence_address: Option<ExtractionField>,
    #[serde(rename = "arbeitsunfaehig_von")]
    pub absence_start: Option<ExtractionField>,
    #[serde(rename = "letzter_tag_der_arbeitsunfaehigkeit")]
    pub absence_end: Option<ExtractionField>,
    #[serde(rename = "grund_der_arbeitsunfaehigkeit")]
    pub absence_reason: Option<ExtractionField>,
    #[serde(rename = "ausstellungsdatum")]
    pub issue_date: Option<ExtractionField>,
    #[serde(rename = "versicherungsnummer")]
    pub insurance_number: Option<ExtractionField>,
}

/// Full backend response for one uploaded document.
///
/// Only `extractions` is required; the identifiers are opaque and default to
/// empty when the backend leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub processing_id: String,
    #[serde(default)]
    pub workflow_id: String,
    #[serde(default)]
    pub workflow_name: String,
    #[serde(default)]
    pub available_results: Vec<String>,
    pub extractions: Extractions,
}

impl ExtractionResult {
    /// Whether a raw payload carries a usable `extractions` block.
    ///
    /// A payload without one must never be accepted as an upload outcome.
    pub fn has_extractions_block(payload: &Value) -> bool {
        payload
            .get("extractions")
            .is_some_and(|extractions| !extractions.is_null())
    }
}

/// Value of an optional field, or `""` when nothing was extracted.
pub(crate) fn value_or_empty(field: &Option<ExtractionField>) -> String {
    field
        .as_ref()
        .map(|f| f.value.clone())
        .unwrap_or_default()
}
