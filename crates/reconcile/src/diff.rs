//! Set difference between two option snapshots

use crate::snapshot::CollectionSnapshot;
use crate::types::ReconciliationDelta;
use serde::{Deserialize, Serialize};

/// Compute what to add and remove to move from `previous` to `desired`
///
/// Membership is decided by fingerprint alone. A record present on both
/// sides is left alone even if its settings or memberships changed; use
/// [`shadowed_changes`] to find those.
pub fn diff(previous: &CollectionSnapshot, desired: &CollectionSnapshot) -> ReconciliationDelta {
    let to_add = desired
        .iter()
        .filter(|(fp, _)| !previous.contains(fp))
        .map(|(_, record)| record.clone())
        .collect();

    let to_remove = previous
        .iter()
        .filter(|(fp, _)| !desired.contains(fp))
        .map(|(_, record)| record.name.clone())
        .collect();

    ReconciliationDelta { to_add, to_remove }
}

/// Names of options whose identity is unchanged but whose contents differ
///
/// These changes are invisible to [`diff`].
pub fn shadowed_changes(previous: &CollectionSnapshot, desired: &CollectionSnapshot) -> Vec<String> {
    let mut names: Vec<String> = desired
        .iter()
        .filter_map(|(fp, wanted)| {
            let current = previous.get(fp)?;
            (!current.same_contents(wanted)).then(|| wanted.label())
        })
        .collect();
    names.sort();
    names
}

/// Diff summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Number of options to add
    pub additions: usize,
    /// Number of options to remove
    pub removals: usize,
    /// Number of options present on both sides
    pub unchanged: usize,
    /// Number of options with changes the delta ignores
    pub shadowed: usize,
}

impl DiffSummary {
    /// Summarize the diff between two snapshots
    pub fn between(previous: &CollectionSnapshot, desired: &CollectionSnapshot) -> Self {
        let delta = diff(previous, desired);
        Self {
            additions: delta.to_add.len(),
            removals: delta.to_remove.len(),
            unchanged: desired.len() - delta.to_add.len(),
            shadowed: shadowed_changes(previous, desired).len(),
        }
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OptionRecord;
    use proptest::prelude::*;

    fn snapshot(records: &[OptionRecord]) -> CollectionSnapshot {
        CollectionSnapshot::from_records(records.iter().cloned())
    }

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    #[test]
    fn test_adds_new_option() {
        let previous = snapshot(&[OptionRecord::new("MARIADB_AUDIT_PLUGIN")]);
        let memcached = OptionRecord::new("MEMCACHED").with_port(11211);
        let desired = snapshot(&[OptionRecord::new("MARIADB_AUDIT_PLUGIN"), memcached.clone()]);

        let delta = diff(&previous, &desired);
        assert_eq!(delta.to_add, vec![memcached]);
        assert!(delta.to_remove.is_empty());
    }

    #[test]
    fn test_removes_by_name() {
        let previous = snapshot(&[
            OptionRecord::new("A").with_port(1),
            OptionRecord::new("B").with_port(2),
        ]);
        let desired = snapshot(&[OptionRecord::new("A").with_port(1)]);

        let delta = diff(&previous, &desired);
        assert!(delta.to_add.is_empty());
        assert_eq!(delta.to_remove, vec!["B".to_string()]);
    }

    #[test]
    fn test_empty_to_empty() {
        let delta = diff(&CollectionSnapshot::new(), &CollectionSnapshot::new());
        assert!(delta.is_empty());
    }

    #[test]
    fn test_port_change_is_remove_plus_add() {
        let previous = snapshot(&[OptionRecord::new("MEMCACHED").with_port(11211)]);
        let desired = snapshot(&[OptionRecord::new("MEMCACHED").with_port(11212)]);

        let delta = diff(&previous, &desired);
        assert_eq!(delta.to_add.len(), 1);
        assert_eq!(delta.to_add[0].port, Some(11212));
        assert_eq!(delta.to_remove, vec!["MEMCACHED".to_string()]);
    }

    #[test]
    fn test_settings_change_not_detected() {
        let previous = snapshot(&[OptionRecord::new("MEMCACHED")
            .with_port(11211)
            .with_setting("CHUNK_SIZE", "32")]);
        let desired = snapshot(&[OptionRecord::new("MEMCACHED")
            .with_port(11211)
            .with_setting("CHUNK_SIZE", "64")]);

        assert!(diff(&previous, &desired).is_empty());
        assert_eq!(shadowed_changes(&previous, &desired), vec!["MEMCACHED:11211"]);
    }

    #[test]
    fn test_shadowed_ignores_setting_order() {
        let previous = snapshot(&[OptionRecord::new("X")
            .with_setting("A", "1")
            .with_setting("B", "2")]);
        let desired = snapshot(&[OptionRecord::new("X")
            .with_setting("B", "2")
            .with_setting("A", "1")]);

        assert!(shadowed_changes(&previous, &desired).is_empty());
    }

    #[test]
    fn test_summary() {
        let previous = snapshot(&[
            OptionRecord::new("A").with_port(1),
            OptionRecord::new("B").with_port(2).with_setting("K", "1"),
        ]);
        let desired = snapshot(&[
            OptionRecord::new("B").with_port(2).with_setting("K", "2"),
            OptionRecord::new("C"),
        ]);

        let summary = DiffSummary::between(&previous, &desired);
        assert_eq!(
            summary,
            DiffSummary {
                additions: 1,
                removals: 1,
                unchanged: 1,
                shadowed: 1,
            }
        );
        assert!(summary.has_changes());
    }

    fn arb_record() -> impl Strategy<Value = OptionRecord> {
        (
            prop_oneof!["A", "B", "C", "MEMCACHED", "OEM"],
            proptest::option::of(1u32..4),
            "[a-z]{0,3}",
        )
            .prop_map(|(name, port, value)| {
                let mut record = OptionRecord::new(name).with_setting("K", value);
                record.port = port;
                record
            })
    }

    fn arb_snapshot() -> impl Strategy<Value = CollectionSnapshot> {
        proptest::collection::vec(arb_record(), 0..8).prop_map(CollectionSnapshot::from_records)
    }

    proptest! {
        #[test]
        fn prop_diff_matches_membership(previous in arb_snapshot(), desired in arb_snapshot()) {
            let delta = diff(&previous, &desired);

            let mut expected_add: Vec<String> = desired
                .iter()
                .filter(|(fp, _)| !previous.contains(fp))
                .map(|(_, r)| r.label())
                .collect();
            expected_add.sort();
            let added = sorted(delta.to_add.iter().map(OptionRecord::label).collect());
            prop_assert_eq!(added, expected_add);

            let expected_remove = sorted(
                previous
                    .iter()
                    .filter(|(fp, _)| !desired.contains(fp))
                    .map(|(_, r)| r.name.clone())
                    .collect(),
            );
            prop_assert_eq!(sorted(delta.to_remove), expected_remove);
        }

        #[test]
        fn prop_diff_with_self_is_empty(snapshot in arb_snapshot()) {
            prop_assert!(diff(&snapshot, &snapshot).is_empty());
        }

        #[test]
        fn prop_swap_is_symmetric(previous in arb_snapshot(), desired in arb_snapshot()) {
            let forward = diff(&previous, &desired);
            let backward = diff(&desired, &previous);

            let added = sorted(forward.to_add.iter().map(|r| r.name.clone()).collect());
            prop_assert_eq!(added, sorted(backward.to_remove));

            let readded = sorted(backward.to_add.iter().map(|r| r.name.clone()).collect());
            prop_assert_eq!(readded, sorted(forward.to_remove));
        }
    }
}
