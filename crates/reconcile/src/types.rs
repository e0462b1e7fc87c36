//! Core types for option-set reconciliation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single `name = value` setting nested inside an option
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OptionSetting {
    pub name: String,
    pub value: String,
}

impl OptionSetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One entry in a resource's option collection
///
/// Only `name` and `port` take part in identity (see [`crate::fingerprint`]).
/// Settings may repeat a name; they are kept as declared.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionRecord {
    /// Option kind, e.g. `MEMCACHED`
    #[serde(rename = "option_name", alias = "name")]
    pub name: String,

    /// Secondary discriminator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,

    /// Directive to the apply call, not part of identity
    #[serde(default)]
    pub apply_immediately: bool,

    #[serde(default)]
    pub db_security_group_memberships: BTreeSet<String>,

    #[serde(default)]
    pub vpc_security_group_memberships: BTreeSet<String>,

    /// Nested settings (order irrelevant)
    #[serde(default, rename = "option_settings", alias = "settings")]
    pub settings: Vec<OptionSetting>,
}

impl OptionRecord {
    /// Create a record with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the port
    pub fn with_port(mut self, port: u32) -> Self {
        self.port = Some(port);
        self
    }

    /// Add a setting
    pub fn with_setting(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.push(OptionSetting::new(name, value));
        self
    }

    /// Add a VPC security group membership
    pub fn with_vpc_security_group(mut self, group: impl Into<String>) -> Self {
        self.vpc_security_group_memberships.insert(group.into());
        self
    }

    /// Add a DB security group membership
    pub fn with_db_security_group(mut self, group: impl Into<String>) -> Self {
        self.db_security_group_memberships.insert(group.into());
        self
    }

    /// Human-readable label, `NAME` or `NAME:port`
    pub fn label(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.name, port),
            None => self.name.clone(),
        }
    }

    /// Compare full contents, treating settings as an unordered multiset
    pub fn same_contents(&self, other: &Self) -> bool {
        let mut ours = self.settings.clone();
        let mut theirs = other.settings.clone();
        ours.sort();
        theirs.sort();

        self.name == other.name
            && self.port == other.port
            && ours == theirs
            && self.apply_immediately == other.apply_immediately
            && self.db_security_group_memberships == other.db_security_group_memberships
            && self.vpc_security_group_memberships == other.vpc_security_group_memberships
    }
}

/// Output of a diff between two snapshots
///
/// `to_add` carries full records because the include call needs complete
/// option definitions; `to_remove` carries names only because removal is
/// name-based. Neither sequence is ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationDelta {
    pub to_add: Vec<OptionRecord>,
    pub to_remove: Vec<String>,
}

impl ReconciliationDelta {
    /// Check if there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

/// Flat key/value tag set
pub type Tags = BTreeMap<String, String>;

/// Tag changes needed to reach the desired tag set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDelta {
    /// Tags to create or overwrite
    pub to_set: Tags,
    /// Tag keys to delete
    pub to_remove: Vec<String>,
}

impl TagDelta {
    pub fn is_empty(&self) -> bool {
        self.to_set.is_empty() && self.to_remove.is_empty()
    }
}

/// Options for a reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct PassOptions {
    /// Compute the delta but apply nothing
    pub dry_run: bool,
}

/// Phase of a reconciliation pass, reported to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    ComputeDelta,
    NoChange,
    ApplyAdditions,
    ApplyRemovals,
    SyncTags,
    Done,
}

impl PassPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ComputeDelta => "computing delta",
            Self::NoChange => "no changes",
            Self::ApplyAdditions => "applying additions",
            Self::ApplyRemovals => "applying removals",
            Self::SyncTags => "synchronizing tags",
            Self::Done => "done",
        }
    }
}

/// How a pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Delta was empty, apply phase skipped
    NoChange,
    /// Delta was applied
    Applied,
    /// Delta computed, nothing applied
    DryRun,
    /// Confirmation declined, nothing applied
    Declined,
}

/// What happened to tag synchronization during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagOutcome {
    /// Tags were reconciled with this delta
    Synced(TagDelta),
    /// Tag sync did not run
    Skipped { reason: String },
}

/// Report of one reconciliation pass
#[derive(Debug, Clone)]
pub struct PassReport {
    pub outcome: PassOutcome,
    /// Delta computed from previous and desired state
    pub delta: ReconciliationDelta,
    /// Options whose contents changed without a change in identity
    pub shadowed: Vec<String>,
    pub tags: TagOutcome,
    /// Resolved resource ARN, if lookup succeeded
    pub arn: Option<String>,
    /// Delta between re-read state and desired state after applying
    pub residual: Option<ReconciliationDelta>,
}

impl PassReport {
    /// Check if the pass changed the option set
    pub fn is_change(&self) -> bool {
        self.outcome == PassOutcome::Applied && !self.delta.is_empty()
    }

    /// Check if the re-read state matched desired state
    pub fn converged(&self) -> bool {
        self.residual.as_ref().is_none_or(ReconciliationDelta::is_empty)
    }
}
