//! Honorific extraction from passenger names

use crate::error::{PipelineError, Result};

const STAGE: &str = "title-extraction";

/// Map a raw honorific to its canonical group. Returns `None` for titles
/// outside the fixed dictionary; callers must treat that as an error rather
/// than let an unmapped category slip through the encoders.
pub fn map_title(raw: &str) -> Option<&'static str> {
    match raw {
        "Capt" | "Col" | "Major" | "Jonkheer" | "Don" | "Sir" | "Dr" | "Rev"
        | "the Countess" | "Dona" | "Lady" => Some("Other"),
        "Mme" | "Ms" | "Mrs" => Some("Mrs"),
        "Mlle" | "Miss" => Some("Miss"),
        "Mr" => Some("Mr"),
        "Master" => Some("Master"),
        _ => None,
    }
}

/// Extract the raw honorific from a name of the form
/// `"Surname, Title. Given names"`: take everything after the first comma,
/// cut at the first period, trim surrounding whitespace.
pub fn extract_raw_title(name: &str) -> Option<&str> {
    let after_comma = name.split_once(',')?.1;
    let before_period = after_comma.split_once('.')?.0;
    Some(before_period.trim())
}

/// Extract and canonicalize the title for one record. `record` identifies the
/// failing row in error messages.
pub fn extract_title(name: &str, record: &str) -> Result<&'static str> {
    let raw = extract_raw_title(name).ok_or_else(|| {
        PipelineError::data(STAGE, format!("malformed name '{name}' in record {record}"))
    })?;
    map_title(raw).ok_or_else(|| PipelineError::unknown_title(STAGE, raw, record))
}
