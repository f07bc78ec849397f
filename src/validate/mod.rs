pub mod conflict;
pub mod curriculum;
pub mod grading;

use serde::Serialize;
use std::collections::BTreeMap;

/// A detected violation of a one-resource-one-active-owner rule.
/// Advisory text plus a disables-selection flag; never mutates inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub with_class_id: String,
    pub with_class_label: String,
    pub message: String,
    pub blocks_selection: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub code: &'static str,
    pub message: String,
}

impl RowError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result of validating a class's full curriculum row set. Row-level
/// violations are keyed by row id; set-level violations have no owning
/// row and surface as class errors.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingReport {
    pub is_valid: bool,
    pub row_errors: BTreeMap<String, Vec<RowError>>,
    pub class_errors: Vec<String>,
}

impl MappingReport {
    pub fn push_row_error(&mut self, row_id: &str, error: RowError) {
        self.row_errors
            .entry(row_id.to_string())
            .or_default()
            .push(error);
    }
}
