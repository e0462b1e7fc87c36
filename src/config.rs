//! User configuration: declared option groups
//!
//! ```toml
//! region = "us-west-2"
//! account_id = "123456789012"
//!
//! [option_groups.my-og]
//! engine_name = "mysql"
//! major_engine_version = "5.6"
//! description = "Memcached for the app tier"
//! tags = { env = "prod" }
//!
//! [[option_groups.my-og.option]]
//! option_name = "MEMCACHED"
//! port = 11211
//! vpc_security_group_memberships = ["sg-0a1b2c"]
//!
//! [[option_groups.my-og.option.option_settings]]
//! name = "CHUNK_SIZE"
//! value = "32"
//! ```

use anyhow::{Context, Result, bail};
use reconcile::{
    CollectionSnapshot, ConfigReader, GroupSpec, OptionRecord, ReadError, Tags, validate_records,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The optsync configuration structure
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct OptsyncConfig {
    /// Region used to compose option group ARNs
    #[serde(default)]
    pub region: String,

    /// Account id; when unset the caller identity recorded in state is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Declared option groups, keyed by group name
    #[serde(default)]
    pub option_groups: BTreeMap<String, OptionGroupConfig>,
}

/// One declared option group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionGroupConfig {
    pub engine_name: String,
    pub major_engine_version: String,
    pub description: String,

    #[serde(default, rename = "option")]
    pub options: Vec<OptionRecord>,

    #[serde(default)]
    pub tags: Tags,
}

impl OptsyncConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "Config file not found: {} (pass --config or set OPTSYNC_CONFIG_DIR)",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))?;

        log::debug!(
            "Loaded {} option groups from {}",
            config.option_groups.len(),
            path.display()
        );
        Ok(config)
    }

    /// Pick a group by name, or the only group when no name is given
    pub fn group(&self, name: Option<&str>) -> Result<DeclaredGroup<'_>> {
        match name {
            Some(name) => self
                .option_groups
                .get_key_value(name)
                .map(|(name, config)| DeclaredGroup { name, config })
                .with_context(|| format!("Option group '{name}' is not declared in config")),
            None => {
                let mut groups = self.option_groups.iter();
                match (groups.next(), groups.next()) {
                    (Some((name, config)), None) => Ok(DeclaredGroup { name, config }),
                    (None, _) => bail!("No option groups declared in config"),
                    _ => bail!(
                        "Config declares several option groups, pick one with --group: {}",
                        self.option_groups
                            .keys()
                            .cloned()
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                }
            }
        }
    }

    /// Validate every declared group, returning one message per problem
    pub fn problems(&self) -> Vec<String> {
        self.option_groups
            .iter()
            .filter_map(|(name, config)| {
                DeclaredGroup { name, config }
                    .validate()
                    .err()
                    .map(|e| format!("{name}: {e}"))
            })
            .collect()
    }
}

/// A declared group borrowed from the config
#[derive(Debug, Clone, Copy)]
pub struct DeclaredGroup<'a> {
    pub name: &'a str,
    pub config: &'a OptionGroupConfig,
}

impl DeclaredGroup<'_> {
    /// Attributes that force replacement
    pub fn spec(&self) -> GroupSpec {
        GroupSpec {
            name: self.name.to_string(),
            engine_name: self.config.engine_name.clone(),
            major_engine_version: self.config.major_engine_version.clone(),
            description: self.config.description.clone(),
        }
    }

    /// Validate the group attributes and every option record
    pub fn validate(&self) -> reconcile::Result<()> {
        self.spec().validate()?;
        validate_records(&self.config.options)
    }

    pub fn tags(&self) -> &Tags {
        &self.config.tags
    }
}

impl ConfigReader for DeclaredGroup<'_> {
    fn read_desired(&self) -> Result<CollectionSnapshot, ReadError> {
        validate_records(&self.config.options).map_err(|e| ReadError::Malformed(e.to_string()))?;
        Ok(CollectionSnapshot::from_records(
            self.config.options.iter().cloned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
region = "us-west-2"

[option_groups.my-og]
engine_name = "mysql"
major_engine_version = "5.6"
description = "test"
tags = { env = "prod" }

[[option_groups.my-og.option]]
option_name = "MEMCACHED"
port = 11211
vpc_security_group_memberships = ["sg-1"]

[[option_groups.my-og.option.option_settings]]
name = "CHUNK_SIZE"
value = "32"

[[option_groups.my-og.option]]
option_name = "MARIADB_AUDIT_PLUGIN"
"#;

    fn parse(content: &str) -> OptsyncConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let config = parse(SAMPLE);
        assert_eq!(config.region, "us-west-2");
        assert!(config.account_id.is_none());

        let group = config.group(None).unwrap();
        assert_eq!(group.name, "my-og");
        assert_eq!(group.config.options.len(), 2);
        assert_eq!(group.config.options[0].port, Some(11211));
        assert_eq!(group.config.options[0].settings[0].value, "32");
        assert_eq!(group.config.options[1].port, None);
        assert_eq!(group.tags().get("env").map(String::as_str), Some("prod"));
        assert!(config.problems().is_empty());
    }

    #[test]
    fn test_read_desired_builds_snapshot() {
        let config = parse(SAMPLE);
        let snapshot = config.group(Some("my-og")).unwrap().read_desired().unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_read_desired_rejects_empty_name() {
        let config = parse(
            r#"
[option_groups.og]
engine_name = "mysql"
major_engine_version = "5.6"
description = "d"

[[option_groups.og.option]]
option_name = ""
"#,
        );
        let group = config.group(None).unwrap();
        assert!(matches!(group.read_desired(), Err(ReadError::Malformed(_))));
        assert_eq!(config.problems().len(), 1);
    }

    #[test]
    fn test_group_selection() {
        let config = parse(
            r#"
[option_groups.a]
engine_name = "mysql"
major_engine_version = "5.6"
description = "a"

[option_groups.b]
engine_name = "mysql"
major_engine_version = "5.7"
description = "b"
"#,
        );
        assert!(config.group(None).is_err());
        assert_eq!(config.group(Some("b")).unwrap().name, "b");
        assert!(config.group(Some("c")).is_err());
    }

    #[test]
    fn test_invalid_group_name_reported() {
        let config = parse(
            r#"
[option_groups.Bad--name]
engine_name = "mysql"
major_engine_version = "5.6"
description = "d"
"#,
        );
        let problems = config.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("Bad--name:"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(OptsyncConfig::load(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = OptsyncConfig::load(&path).unwrap();
        assert_eq!(config.option_groups.len(), 1);
    }
}
