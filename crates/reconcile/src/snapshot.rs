//! Point-in-time option collections keyed by fingerprint

use crate::fingerprint::Fingerprint;
use crate::types::OptionRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Full state of an option collection at one point in time
///
/// Fingerprints are unique by construction. Inserting a record whose
/// fingerprint is already present replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<OptionRecord>", into = "Vec<OptionRecord>")]
pub struct CollectionSnapshot {
    records: HashMap<Fingerprint, OptionRecord>,
}

impl CollectionSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from records, last write wins on collision
    pub fn from_records(records: impl IntoIterator<Item = OptionRecord>) -> Self {
        let mut snapshot = Self::new();
        for record in records {
            snapshot.insert(record);
        }
        snapshot
    }

    /// Insert a record, returning the one it replaced
    pub fn insert(&mut self, record: OptionRecord) -> Option<OptionRecord> {
        let fp = record.fingerprint();
        let replaced = self.records.insert(fp, record);
        if let Some(old) = &replaced {
            log::debug!("Option {} ({}) declared twice, keeping the last", old.label(), fp);
        }
        replaced
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&OptionRecord> {
        self.records.get(fingerprint)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.records.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over `(fingerprint, record)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&Fingerprint, &OptionRecord)> {
        self.records.iter()
    }

    /// Records sorted by name, then port
    pub fn sorted(&self) -> Vec<&OptionRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name).then(a.port.cmp(&b.port)));
        records
    }

    /// Consume the snapshot into records sorted by name, then port
    pub fn into_sorted(self) -> Vec<OptionRecord> {
        let mut records: Vec<_> = self.records.into_values().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name).then(a.port.cmp(&b.port)));
        records
    }

    /// Remove every record with the given name except those in `keep`,
    /// returning how many went
    ///
    /// Removal is by name, so a pass that moves an option to a new port
    /// passes the fingerprints it just included as `keep`.
    pub fn remove_named(&mut self, name: &str, keep: &HashSet<Fingerprint>) -> usize {
        let before = self.records.len();
        self.records
            .retain(|fp, r| r.name != name || keep.contains(fp));
        before - self.records.len()
    }
}

impl From<Vec<OptionRecord>> for CollectionSnapshot {
    fn from(records: Vec<OptionRecord>) -> Self {
        Self::from_records(records)
    }
}

impl From<CollectionSnapshot> for Vec<OptionRecord> {
    fn from(snapshot: CollectionSnapshot) -> Self {
        snapshot.into_sorted()
    }
}

impl FromIterator<OptionRecord> for CollectionSnapshot {
    fn from_iter<I: IntoIterator<Item = OptionRecord>>(iter: I) -> Self {
        Self::from_records(iter)
    }
}
