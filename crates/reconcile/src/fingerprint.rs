//! Content-based identity for option records
//!
//! A record's fingerprint is derived from `(name, port)` only, so two
//! declarations of the same option with different settings share an
//! identity. An unset port hashes exactly like an explicit port of `0`.

use crate::types::OptionRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Port value used in the canonical key when no port is set
const UNSET_PORT: u32 = 0;

/// Deterministic identity of an option record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Fingerprint a `(name, port)` pair
    pub fn of(name: &str, port: Option<u32>) -> Self {
        let key = canonical_key(name, port);
        let digest = blake3::hash(key.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        Self(u64::from_le_bytes(head))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Fingerprint a record
pub fn fingerprint(record: &OptionRecord) -> Fingerprint {
    Fingerprint::of(&record.name, record.port)
}

impl OptionRecord {
    pub fn fingerprint(&self) -> Fingerprint {
        fingerprint(self)
    }
}

/// Canonical `"<name>-<port>-"` key fed to the hash
fn canonical_key(name: &str, port: Option<u32>) -> String {
    format!("{}-{}-", name, port.unwrap_or(UNSET_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("MEMCACHED", Some(11211)), "MEMCACHED-11211-");
        assert_eq!(canonical_key("MARIADB_AUDIT_PLUGIN", None), "MARIADB_AUDIT_PLUGIN-0-");
    }

    #[test]
    fn test_ignores_settings_and_memberships() {
        let bare = OptionRecord::new("MEMCACHED").with_port(11211);
        let dressed = OptionRecord::new("MEMCACHED")
            .with_port(11211)
            .with_setting("CHUNK_SIZE", "32")
            .with_vpc_security_group("sg-123");

        assert_eq!(fingerprint(&bare), fingerprint(&dressed));
    }

    #[test]
    fn test_unset_port_matches_zero() {
        let unset = OptionRecord::new("OEM");
        let zero = OptionRecord::new("OEM").with_port(0);
        assert_eq!(unset.fingerprint(), zero.fingerprint());
    }

    #[test]
    fn test_name_and_port_discriminate() {
        let a = Fingerprint::of("MEMCACHED", Some(11211));
        assert_ne!(a, Fingerprint::of("MEMCACHED", Some(11212)));
        assert_ne!(a, Fingerprint::of("MEMCACHED", None));
        assert_ne!(a, Fingerprint::of("memcached", Some(11211)));
    }

    #[test]
    fn test_stable_across_calls() {
        let fp = Fingerprint::of("MEMCACHED", Some(11211));
        assert_eq!(fp, Fingerprint::of("MEMCACHED", Some(11211)));
        assert_eq!(fp.to_string().len(), 16);
    }

    proptest! {
        #[test]
        fn prop_identity_is_name_and_port_only(
            name in "[A-Z_]{1,24}",
            port in proptest::option::of(0u32..65536),
            settings in proptest::collection::vec(("[A-Z_]{1,8}", "[a-z0-9]{0,8}"), 0..4),
            groups in proptest::collection::btree_set("sg-[0-9a-f]{4}", 0..3),
        ) {
            let plain = OptionRecord { name: name.clone(), port, ..OptionRecord::default() };
            let mut rich = OptionRecord { name, port, ..OptionRecord::default() };
            for (k, v) in settings {
                rich = rich.with_setting(k, v);
            }
            rich.vpc_security_group_memberships = groups;
            rich.apply_immediately = true;

            prop_assert_eq!(fingerprint(&plain), fingerprint(&rich));
        }
    }
}
