//! Flat key/value tag diffing

use crate::types::{TagDelta, Tags};

/// Compute the tag changes needed to turn `current` into `desired`
///
/// Keys missing from `desired` are removed. New keys and keys whose value
/// changed are set; setting overwrites, so changed keys are not removed
/// first.
pub fn diff_tags(current: &Tags, desired: &Tags) -> TagDelta {
    let to_set = desired
        .iter()
        .filter(|(key, value)| current.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let to_remove = current
        .keys()
        .filter(|key| !desired.contains_key(*key))
        .cloned()
        .collect();

    TagDelta { to_set, to_remove }
}

/// Apply a tag delta to a tag set in place
pub fn apply_tag_delta(tags: &mut Tags, delta: &TagDelta) {
    for key in &delta.to_remove {
        tags.remove(key);
    }
    for (key, value) in &delta.to_set {
        tags.insert(key.clone(), value.clone());
    }
}
