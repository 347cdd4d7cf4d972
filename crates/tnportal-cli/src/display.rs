//! Terminal rendering of the review and confirmation steps.
//!
//! Cards are vertical `label  value` lists, one section per concern, with
//! empty values shown as a dash.

use tnportal_core::{ExtractionField, ExtractionResult, ReviewField, ReviewState, UploadData};

const EMPTY: &str = "—";

// ── Public API ──

/// Extraction quality per field, so the participant knows what to check.
///
/// Written to stderr: stdout carries only page state.
pub fn print_extraction_notes(result: &ExtractionResult) {
    for line in extraction_notes(result) {
        eprintln!("{line}");
    }
    eprintln!();
}

fn extraction_notes(result: &ExtractionResult) -> Vec<String> {
    let e = &result.extractions;
    let fields: [(&str, &Option<ExtractionField>); 8] = [
        ("First name", &e.first_name),
        ("Last name", &e.last_name),
        ("Start date", &e.absence_start),
        ("End date", &e.absence_end),
        ("Address", &e.absence_address),
        ("Reason", &e.absence_reason),
        ("Issue date", &e.issue_date),
        ("Insurance number", &e.insurance_number),
    ];

    let mut lines = Vec::new();
    if !e.document_type.is_empty() {
        lines.push(format!("  {:<26} {}", "Document type", e.document_type));
    }
    let mut missing = Vec::new();
    for (label, field) in fields {
        let Some(field) = field else {
            missing.push(label);
            continue;
        };
        if field.validation_problem || !field.note.is_empty() {
            let note = if field.note.is_empty() {
                "please check"
            } else {
                field.note.as_str()
            };
            lines.push(format!(
                "  {:<26} {} (confidence {})",
                label, note, field.confidence
            ));
        }
    }
    if !missing.is_empty() {
        lines.push(format!("  {:<26} {}", "Not found", missing.join(", ")));
    }
    lines
}

/// Review card: displayed fields in page order, editable ones marked.
pub fn print_review_card(state: &ReviewState) {
    println!("=== Review ===");
    println!();
    println!("Extracted data");
    for field in ReviewField::displayed() {
        let marker = if field.is_editable() { "*" } else { " " };
        println!(
            " {marker}{:<26} {}",
            field.label(),
            or_dash(state.get(field))
        );
    }
    println!();
    println!("  * can be corrected with --start / --end");
    println!();
}

/// Confirmation card for the submitted record.
pub fn print_confirmation_card(data: &UploadData) {
    println!("=== Absence submitted ===");
    println!();
    print_section(
        "Participant",
        &[
            ("First name", &data.first_name),
            ("Last name", &data.last_name),
            ("Insurance number", &data.insurance_number),
        ],
    );
    print_section(
        "Absence",
        &[
            ("Start date", &data.start),
            ("End date", &data.end),
            ("Issue date", &data.issue_date),
            ("Reason", &data.reason),
            ("Address", &data.address),
        ],
    );
}

// ── Section rendering ──

fn print_section(header: &str, rows: &[(&str, &String)]) {
    println!("{header}");
    for (label, value) in rows {
        println!("  {:<26} {}", label, or_dash(value));
    }
    println!();
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { EMPTY } else { value }
}
