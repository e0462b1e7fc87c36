//! Boundary validation for declared option groups
//!
//! Runs once where config or state is parsed, so the differencer only ever
//! sees well-formed records.

use crate::error::{Error, Result};
use crate::types::OptionRecord;
use regex::Regex;
use std::sync::LazyLock;

/// Longest option group name the control plane accepts
pub const MAX_GROUP_NAME_LEN: usize = 255;

static LEADING_LETTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z]").unwrap());
static ALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9A-Za-z-]+$").unwrap());

/// Validate an option group name, collecting every problem found
pub fn validate_group_name(name: &str) -> Result<()> {
    let mut problems = Vec::new();

    if !LEADING_LETTER.is_match(name) {
        problems.push("first character must be a lowercase letter".to_string());
    }
    if !ALLOWED_CHARS.is_match(name) {
        problems.push("only alphanumeric characters and hyphens allowed".to_string());
    }
    if name.contains("--") {
        problems.push("cannot contain two consecutive hyphens".to_string());
    }
    if name.ends_with('-') {
        problems.push("cannot end with a hyphen".to_string());
    }
    if name.len() > MAX_GROUP_NAME_LEN {
        problems.push(format!("cannot be longer than {MAX_GROUP_NAME_LEN} characters"));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidName {
            name: name.to_string(),
            problems,
        })
    }
}

/// Reject records the differencer cannot work with
pub fn validate_record(record: &OptionRecord) -> Result<()> {
    if record.name.trim().is_empty() {
        return Err(Error::MalformedRecord {
            reason: "option_name is required".to_string(),
        });
    }

    if let Some(setting) = record.settings.iter().find(|s| s.name.trim().is_empty()) {
        return Err(Error::MalformedRecord {
            reason: format!(
                "option {} has a setting with an empty name (value {:?})",
                record.label(),
                setting.value
            ),
        });
    }

    Ok(())
}

/// Validate every record in a declaration
pub fn validate_records<'a>(records: impl IntoIterator<Item = &'a OptionRecord>) -> Result<()> {
    records.into_iter().try_for_each(validate_record)
}
