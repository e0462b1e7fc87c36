//! File-backed control plane
//!
//! Persists option groups, their options and tags to a TOML file so the
//! reconciliation engine can run end to end without a remote API. It plays
//! every collaborator role the pass needs: state reader, option applier,
//! tag synchronizer and caller identity lookup.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use reconcile::{
    AccountLookup, ApplyError, CollectionSnapshot, Fingerprint, GroupSpec, LookupError, OptionApplier,
    OptionRecord, ReadError, StateReader, TagDelta, TagError, TagSynchronizer, Tags,
    apply_tag_delta, diff_tags,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// State Structures
// ============================================================================

/// Everything the local control plane knows
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaneState {
    /// Caller identity used to derive the account id for ARNs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_arn: Option<String>,

    /// Last time the state was written
    pub last_updated: DateTime<Utc>,

    /// Option groups keyed by name
    #[serde(default)]
    pub option_groups: BTreeMap<String, GroupState>,
}

impl Default for PlaneState {
    fn default() -> Self {
        Self {
            caller_arn: None,
            option_groups: BTreeMap::new(),
            last_updated: Utc::now(),
        }
    }
}

/// One option group as stored
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupState {
    pub engine_name: String,
    pub major_engine_version: String,
    pub description: String,

    /// ARN the group was last tagged under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub tags: Tags,

    #[serde(default)]
    pub options: CollectionSnapshot,
}

impl GroupState {
    pub fn spec(&self, name: &str) -> GroupSpec {
        GroupSpec {
            name: name.to_string(),
            engine_name: self.engine_name.clone(),
            major_engine_version: self.major_engine_version.clone(),
            description: self.description.clone(),
        }
    }
}

// ============================================================================
// LocalPlane
// ============================================================================

/// Control plane stored in a single TOML file
#[derive(Debug)]
pub struct LocalPlane {
    path: PathBuf,
    state: RefCell<PlaneState>,
    /// Options included since the last read, spared by name-based removal
    included: RefCell<HashSet<Fingerprint>>,
}

impl LocalPlane {
    /// Open the state file, starting empty if it does not exist
    pub fn open(path: &Path) -> Result<Self> {
        let state = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read state file: {}", path.display()))?;
            let state: PlaneState = toml::from_str(&content)
                .with_context(|| format!("Failed to parse state file: {}", path.display()))?;
            log::debug!("Loaded state from {}", path.display());
            state
        } else {
            log::debug!("State file does not exist, using default state");
            PlaneState::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state: RefCell::new(state),
            included: RefCell::new(HashSet::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let mut state = self.state.borrow_mut();
        state.last_updated = Utc::now();
        let content = toml::to_string_pretty(&*state).context("Failed to serialize state to TOML")?;

        fs::write(&self.path, &content)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;

        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }

    /// Snapshot of a stored group
    pub fn group(&self, name: &str) -> Option<GroupState> {
        self.state.borrow().option_groups.get(name).cloned()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.state.borrow().option_groups.keys().cloned().collect()
    }

    pub fn recorded_caller(&self) -> Option<String> {
        self.state.borrow().caller_arn.clone()
    }

    /// Create an empty option group
    pub fn create_group(&self, spec: &GroupSpec, tags: &Tags) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if state.option_groups.contains_key(&spec.name) {
                bail!("Option group '{}' already exists", spec.name);
            }
            state.option_groups.insert(
                spec.name.clone(),
                GroupState {
                    engine_name: spec.engine_name.clone(),
                    major_engine_version: spec.major_engine_version.clone(),
                    description: spec.description.clone(),
                    arn: None,
                    created_at: Utc::now(),
                    tags: tags.clone(),
                    options: CollectionSnapshot::new(),
                },
            );
        }
        log::info!("Created option group {}", spec.name);
        self.save()
    }

    /// Delete an option group, returning false if it did not exist
    pub fn delete_group(&self, name: &str) -> Result<bool> {
        let removed = self.state.borrow_mut().option_groups.remove(name).is_some();
        if removed {
            log::info!("Deleted option group {name}");
            self.save()?;
        }
        Ok(removed)
    }

    /// Record the caller identity used for ARN lookups
    pub fn set_caller_arn(&self, arn: Option<String>) -> Result<()> {
        self.state.borrow_mut().caller_arn = arn;
        self.save()
    }

    fn save_for_apply(&self) -> Result<(), ApplyError> {
        self.save().map_err(|e| ApplyError::Backend(format!("{e:#}")))
    }
}

// ============================================================================
// Collaborator roles
// ============================================================================

impl StateReader for LocalPlane {
    fn read_current(&self, resource_id: &str) -> Result<CollectionSnapshot, ReadError> {
        self.included.borrow_mut().clear();
        self.state
            .borrow()
            .option_groups
            .get(resource_id)
            .map(|g| g.options.clone())
            .ok_or_else(|| ReadError::NotFound(resource_id.to_string()))
    }
}

impl OptionApplier for LocalPlane {
    fn apply_additions(&self, resource_id: &str, to_add: &[OptionRecord]) -> Result<(), ApplyError> {
        {
            let mut state = self.state.borrow_mut();
            let group = state
                .option_groups
                .get_mut(resource_id)
                .ok_or_else(|| ApplyError::Rejected {
                    operation: "include options",
                    resource: resource_id.to_string(),
                    message: "option group not found".to_string(),
                })?;
            let mut included = self.included.borrow_mut();
            for record in to_add {
                log::debug!("Including option {} in {resource_id}", record.label());
                included.insert(record.fingerprint());
                group.options.insert(record.clone());
            }
        }
        self.save_for_apply()
    }

    fn apply_removals(&self, resource_id: &str, to_remove: &[String]) -> Result<(), ApplyError> {
        {
            let mut state = self.state.borrow_mut();
            let group = state
                .option_groups
                .get_mut(resource_id)
                .ok_or_else(|| ApplyError::Rejected {
                    operation: "remove options",
                    resource: resource_id.to_string(),
                    message: "option group not found".to_string(),
                })?;

            let included = self.included.borrow();
            let missing: Vec<&str> = to_remove
                .iter()
                .filter(|name| {
                    !group
                        .options
                        .iter()
                        .any(|(fp, r)| &r.name == *name && !included.contains(fp))
                })
                .map(String::as_str)
                .collect();
            if !missing.is_empty() {
                return Err(ApplyError::Rejected {
                    operation: "remove options",
                    resource: resource_id.to_string(),
                    message: format!("options not in group: {}", missing.join(", ")),
                });
            }

            for name in to_remove {
                log::debug!("Removing option {name} from {resource_id}");
                group.options.remove_named(name, &included);
            }
        }
        self.save_for_apply()
    }
}

impl TagSynchronizer for LocalPlane {
    fn sync_tags(&self, arn: &str, desired: &Tags) -> Result<TagDelta, TagError> {
        let name = arn.rsplit(':').next().unwrap_or_default();
        let delta = {
            let mut state = self.state.borrow_mut();
            let group = state
                .option_groups
                .get_mut(name)
                .ok_or_else(|| TagError::UnknownResource(arn.to_string()))?;

            let delta = diff_tags(&group.tags, desired);
            apply_tag_delta(&mut group.tags, &delta);
            group.arn = Some(arn.to_string());
            delta
        };

        self.save()
            .map_err(|e| TagError::Backend(format!("{e:#}")))?;
        Ok(delta)
    }
}

impl AccountLookup for LocalPlane {
    fn caller_arn(&self) -> Result<String, LookupError> {
        self.state
            .borrow()
            .caller_arn
            .clone()
            .ok_or_else(|| LookupError::Unavailable("no caller identity recorded in state".into()))
    }
}
