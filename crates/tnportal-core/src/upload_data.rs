//! Business fields carried between the upload, review and confirmation steps.
//!
//! The steps hand [`UploadData`] to each other as URL-encoded page state, the
//! same way a browser carries search parameters across a navigation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

use crate::extraction::{ExtractionResult, value_or_empty};

/// Query keys in page order.
pub const FIELD_KEYS: [&str; 8] = [
    "firstName",
    "lastName",
    "start",
    "end",
    "address",
    "reason",
    "issueDate",
    "insuranceNumber",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("page state is missing field `{0}`")]
    MissingField(&'static str),
}

/// The eight business fields of an absence notice.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadData {
    pub first_name: String,
    pub last_name: String,
    pub start: String,
    pub end: String,
    pub address: String,
    pub reason: String,
    pub issue_date: String,
    pub insurance_number: String,
}

impl From<&ExtractionResult> for UploadData {
    /// Select the `.value` of each business field. Absent fields become `""`;
    /// `document_type` and the backend identifiers are dropped here.
    fn from(result: &ExtractionResult) -> Self {
        let e = &result.extractions;
        Self {
            first_name: value_or_empty(&e.first_name),
            last_name: value_or_empty(&e.last_name),
            start: value_or_empty(&e.absence_start),
            end: value_or_empty(&e.absence_end),
            address: value_or_empty(&e.absence_address),
            reason: value_or_empty(&e.absence_reason),
            issue_date: value_or_empty(&e.issue_date),
            insurance_number: value_or_empty(&e.insurance_number),
        }
    }
}

impl UploadData {
    /// Value for a query key from [`FIELD_KEYS`].
    pub fn field(&self, key: &str) -> Option<&str> {
        let value = match key {
            "firstName" => &self.first_name,
            "lastName" => &self.last_name,
            "start" => &self.start,
            "end" => &self.end,
            "address" => &self.address,
            "reason" => &self.reason,
            "issueDate" => &self.issue_date,
            "insuranceNumber" => &self.insurance_number,
            _ => return None,
        };
        Some(value.as_str())
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "firstName" => Some(&mut self.first_name),
            "lastName" => Some(&mut self.last_name),
            "start" => Some(&mut self.start),
            "end" => Some(&mut self.end),
            "address" => Some(&mut self.address),
            "reason" => Some(&mut self.reason),
            "issueDate" => Some(&mut self.issue_date),
            "insuranceNumber" => Some(&mut self.insurance_number),
            _ => None,
        }
    }

    /// Encode as `application/x-www-form-urlencoded` page state.
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for key in FIELD_KEYS {
            serializer.append_pair(key, self.field(key).unwrap_or_default());
        }
        serializer.finish()
    }

    /// Decode page state for the review step: missing keys become `""` and
    /// unknown keys are ignored.
    pub fn from_query_lenient(query: &str) -> Self {
        let mut data = Self::default();
        for (key, value) in form_urlencoded::parse(strip_question_mark(query).as_bytes()) {
            if let Some(slot) = data.field_mut(&key) {
                *slot = value.into_owned();
            }
        }
        data
    }

    /// Decode page state for the confirmation step, where every field must be
    /// present (an empty value is fine, a missing key is not).
    pub fn from_query_strict(query: &str) -> Result<Self, StateError> {
        let mut data = Self::default();
        let mut seen = [false; FIELD_KEYS.len()];
        for (key, value) in form_urlencoded::parse(strip_question_mark(query).as_bytes()) {
            if let Some(idx) = FIELD_KEYS.iter().position(|k| *k == key)
                && let Some(slot) = data.field_mut(&key)
            {
                *slot = value.into_owned();
                seen[idx] = true;
            }
        }
        if let Some(idx) = seen.iter().position(|s| !s) {
            return Err(StateError::MissingField(FIELD_KEYS[idx]));
        }
        Ok(data)
    }
}

fn strip_question_mark(query: &str) -> &str {
    query.strip_prefix('?').unwrap_or(query)
}
