//! # Reconcile
//!
//! Declarative reconciliation of a resource's option collection.
//!
//! A resource (a DB option group) carries an unordered set of options, each
//! with nested settings and security-group memberships. This crate converges
//! that set toward a declared state with incremental include/remove calls,
//! without recreating the resource.
//!
//! ## Core Concepts
//!
//! - **Fingerprint**: identity of an option derived from `(name, port)` only
//! - **CollectionSnapshot**: the option set at one point in time, keyed by fingerprint
//! - **ReconciliationDelta**: full records to add, names to remove
//! - **reconcile**: one pass of read, diff, apply additions, apply removals, sync tags
//!
//! ## Example
//!
//! ```
//! use reconcile::{CollectionSnapshot, OptionRecord, diff};
//!
//! let previous = CollectionSnapshot::from_records([OptionRecord::new("MARIADB_AUDIT_PLUGIN")]);
//! let desired = CollectionSnapshot::from_records([
//!     OptionRecord::new("MARIADB_AUDIT_PLUGIN"),
//!     OptionRecord::new("MEMCACHED").with_port(11211),
//! ]);
//!
//! let delta = diff(&previous, &desired);
//! assert_eq!(delta.to_add.len(), 1);
//! assert!(delta.to_remove.is_empty());
//! ```
//!
//! ## Collaborator Traits
//!
//! The pass talks to the outside world only through traits passed in a
//! [`ReconcileContext`]:
//!
//! - [`StateReader`] / [`ConfigReader`]: current and declared snapshots
//! - [`OptionApplier`]: include and remove calls
//! - [`IdentityResolver`]: resource ARN for tagging
//! - [`TagSynchronizer`]: tag convergence
//! - [`ProgressCallback`] / [`ConfirmCallback`]: UI hooks
//!
//! Apply failures abort the pass. A failed ARN lookup only skips tag sync.

pub mod arn;
pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod fingerprint;
pub mod group;
pub mod snapshot;
pub mod tags;
pub mod types;
pub mod validate;

// Re-export main types at crate root
pub use arn::{ArnResolver, StaticAccount, account_from_arn, option_group_arn};
pub use context::{
    AccountLookup, AutoConfirm, AutoDecline, ConfigReader, ConfirmCallback, IdentityResolver,
    NoProgress, OptionApplier, ProgressCallback, ReconcileContext, StateReader, TagSynchronizer,
};
pub use diff::{DiffSummary, diff, shadowed_changes};
pub use error::{ApplyError, ConfirmError, Error, LookupError, ReadError, Result, TagError};
pub use executor::{reconcile, reconcile_simple};
pub use fingerprint::{Fingerprint, fingerprint};
pub use group::{GroupSpec, ensure_in_place, replacement_fields};
pub use snapshot::CollectionSnapshot;
pub use tags::{apply_tag_delta, diff_tags};
pub use types::{
    OptionRecord, OptionSetting, PassOptions, PassOutcome, PassPhase, PassReport,
    ReconciliationDelta, TagDelta, TagOutcome, Tags,
};
pub use validate::{validate_group_name, validate_record, validate_records};
