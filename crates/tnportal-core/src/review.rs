//! Editable copy of the extracted fields shown on the review step.

use std::fmt;

use thiserror::Error;

use crate::upload_data::UploadData;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("field `{0}` is read-only on the review step")]
    ReadOnly(ReviewField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewField {
    FirstName,
    LastName,
    Start,
    End,
    Address,
    Reason,
    IssueDate,
    InsuranceNumber,
}

impl ReviewField {
    pub const ALL: [ReviewField; 8] = [
        ReviewField::FirstName,
        ReviewField::LastName,
        ReviewField::Start,
        ReviewField::End,
        ReviewField::Address,
        ReviewField::Reason,
        ReviewField::IssueDate,
        ReviewField::InsuranceNumber,
    ];

    /// Page-state key of this field.
    pub fn key(self) -> &'static str {
        match self {
            ReviewField::FirstName => "firstName",
            ReviewField::LastName => "lastName",
            ReviewField::Start => "start",
            ReviewField::End => "end",
            ReviewField::Address => "address",
            ReviewField::Reason => "reason",
            ReviewField::IssueDate => "issueDate",
            ReviewField::InsuranceNumber => "insuranceNumber",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewField::FirstName => "First name",
            ReviewField::LastName => "Last name",
            ReviewField::Start => "Start date",
            ReviewField::End => "End date",
            ReviewField::Address => "Address",
            ReviewField::Reason => "Reason",
            ReviewField::IssueDate => "Issue date",
            ReviewField::InsuranceNumber => "Insurance number",
        }
    }

    /// Only the absence period may be corrected by the participant.
    pub fn is_editable(self) -> bool {
        matches!(self, ReviewField::Start | ReviewField::End)
    }

    /// Fields rendered on the review step, in display order. The rest are
    /// carried through to the confirmation unchanged.
    pub fn displayed() -> [ReviewField; 5] {
        [
            ReviewField::FirstName,
            ReviewField::LastName,
            ReviewField::InsuranceNumber,
            ReviewField::Start,
            ReviewField::End,
        ]
    }
}

impl fmt::Display for ReviewField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// In-memory edit state for one review page visit.
#[derive(Debug, Clone)]
pub struct ReviewState {
    original: UploadData,
    values: UploadData,
}

impl ReviewState {
    pub fn new(data: UploadData) -> Self {
        Self {
            original: data.clone(),
            values: data,
        }
    }

    pub fn get(&self, field: ReviewField) -> &str {
        let values = &self.values;
        match field {
            ReviewField::FirstName => &values.first_name,
            ReviewField::LastName => &values.last_name,
            ReviewField::Start => &values.start,
            ReviewField::End => &values.end,
            ReviewField::Address => &values.address,
            ReviewField::Reason => &values.reason,
            ReviewField::IssueDate => &values.issue_date,
            ReviewField::InsuranceNumber => &values.insurance_number,
        }
    }

    pub fn set(&mut self, field: ReviewField, value: impl Into<String>) -> Result<(), ReviewError> {
        let slot = match field {
            ReviewField::Start => &mut self.values.start,
            ReviewField::End => &mut self.values.end,
            other => return Err(ReviewError::ReadOnly(other)),
        };
        *slot = value.into();
        tracing::debug!(field = %field, "review field edited");
        Ok(())
    }

    /// True once any value differs from what the extraction produced.
    pub fn is_dirty(&self) -> bool {
        self.original != self.values
    }

    pub fn values(&self) -> &UploadData {
        &self.values
    }

    /// Body for the confirmation request.
    pub fn into_submission(self) -> UploadData {
        self.values
    }
}
