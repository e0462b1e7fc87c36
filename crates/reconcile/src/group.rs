//! Option group attributes that cannot change in place

use crate::error::{Error, Result};
use crate::validate::validate_group_name;
use serde::{Deserialize, Serialize};

/// The replacement-only attributes of an option group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub engine_name: String,
    pub major_engine_version: String,
    pub description: String,
}

impl GroupSpec {
    /// Check the name rules and required fields
    pub fn validate(&self) -> Result<()> {
        validate_group_name(&self.name)?;
        for (field, value) in [
            ("engine_name", &self.engine_name),
            ("major_engine_version", &self.major_engine_version),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(Error::MalformedRecord {
                    reason: format!("option group {} is missing {field}", self.name),
                });
            }
        }
        Ok(())
    }
}

/// Attributes that differ between an existing group and the declared one
pub fn replacement_fields(current: &GroupSpec, desired: &GroupSpec) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if current.name != desired.name {
        fields.push("name");
    }
    if current.engine_name != desired.engine_name {
        fields.push("engine_name");
    }
    if current.major_engine_version != desired.major_engine_version {
        fields.push("major_engine_version");
    }
    if current.description != desired.description {
        fields.push("description");
    }
    fields
}

/// Fail if the declared group cannot be reached without replacement
pub fn ensure_in_place(current: &GroupSpec, desired: &GroupSpec) -> Result<()> {
    let fields = replacement_fields(current, desired);
    if fields.is_empty() {
        Ok(())
    } else {
        Err(Error::ReplacementRequired {
            name: desired.name.clone(),
            fields,
        })
    }
}
