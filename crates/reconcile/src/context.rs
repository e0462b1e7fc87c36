//! Collaborator traits and the reconcile context
//!
//! These traits let the engine run against any control plane without
//! depending on a specific client, credential source, or UI.

use crate::error::{ApplyError, ConfirmError, LookupError, ReadError, TagError};
use crate::snapshot::CollectionSnapshot;
use crate::types::{OptionRecord, PassPhase, TagDelta, Tags};

/// Source of the authoritative current option collection
pub trait StateReader {
    /// Fetch the current collection for a resource
    fn read_current(&self, resource_id: &str) -> Result<CollectionSnapshot, ReadError>;
}

/// Source of the user-declared option collection
///
/// Implementations own the parsed user configuration and are responsible
/// for validating it before building the snapshot.
pub trait ConfigReader {
    fn read_desired(&self) -> Result<CollectionSnapshot, ReadError>;
}

/// Issues incremental option changes against the remote resource
///
/// Additions and removals of one pass behave as a single modification:
/// a removal never drops an option included earlier in the same pass, so
/// moving an option to a new port (include `NAME:new`, remove `NAME`)
/// leaves only the new port.
pub trait OptionApplier {
    /// Include these options; must be all-or-nothing
    fn apply_additions(&self, resource_id: &str, to_add: &[OptionRecord]) -> Result<(), ApplyError>;

    /// Remove options by name, sparing ones included earlier in the pass
    fn apply_removals(&self, resource_id: &str, to_remove: &[String]) -> Result<(), ApplyError>;
}

/// Derives the fully-qualified identifier of a resource
pub trait IdentityResolver {
    fn resource_arn(&self, resource_id: &str) -> Result<String, LookupError>;
}

/// Looks up the caller's own ARN
///
/// Used by [`crate::arn::ArnResolver`] to find the account id.
pub trait AccountLookup {
    fn caller_arn(&self) -> Result<String, LookupError>;
}

impl<T: AccountLookup + ?Sized> AccountLookup for &T {
    fn caller_arn(&self) -> Result<String, LookupError> {
        (**self).caller_arn()
    }
}

impl<T: AccountLookup + ?Sized> AccountLookup for Box<T> {
    fn caller_arn(&self) -> Result<String, LookupError> {
        (**self).caller_arn()
    }
}

/// Reconciles the flat tag set of a resource
pub trait TagSynchronizer {
    /// Converge tags on `arn` to `desired`, returning what changed
    fn sync_tags(&self, arn: &str, desired: &Tags) -> Result<TagDelta, TagError>;
}

/// Progress callback for reconciliation passes
pub trait ProgressCallback {
    /// Called when the pass enters a phase
    fn on_phase(&mut self, phase: PassPhase);

    /// Called before an apply call with the number of options involved
    fn on_apply_start(&mut self, phase: PassPhase, count: usize);

    /// Called after an apply call succeeds
    fn on_apply_complete(&mut self, phase: PassPhase);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> Result<bool, ConfirmError>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase(&mut self, _phase: PassPhase) {}
    fn on_apply_start(&mut self, _phase: PassPhase, _count: usize) {}
    fn on_apply_complete(&mut self, _phase: PassPhase) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool, ConfirmError> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool, ConfirmError> {
        Ok(false)
    }
}

/// Explicit collaborators for one reconciliation pass
pub struct ReconcileContext<'a> {
    /// Identifier of the resource being reconciled
    pub resource_id: &'a str,
    pub state: &'a dyn StateReader,
    pub desired: &'a dyn ConfigReader,
    pub applier: &'a dyn OptionApplier,
    pub identity: &'a dyn IdentityResolver,
    pub tags: &'a dyn TagSynchronizer,
}
