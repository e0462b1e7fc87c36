//! Error types for option-set reconciliation
//!
//! The differencer itself never fails. Everything here comes from the
//! collaborator boundary: reading state or config, applying a delta,
//! resolving the resource ARN, or synchronizing tags.

use thiserror::Error;

/// Failure reading a snapshot from state or user configuration
#[derive(Debug, Error)]
pub enum ReadError {
    /// The resource does not exist in the backing store
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The stored or declared data could not be parsed
    #[error("malformed input: {0}")]
    Malformed(String),

    /// The backing store failed
    #[error("backend error: {0}")]
    Backend(String),
}

/// Failure applying additions or removals to the remote resource
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The control plane rejected the whole operation
    #[error("{operation} rejected for {resource}: {message}")]
    Rejected {
        operation: &'static str,
        resource: String,
        message: String,
    },

    /// The backing store failed
    #[error("backend error: {0}")]
    Backend(String),
}

/// Failure resolving the fully-qualified resource identifier
#[derive(Debug, Error)]
pub enum LookupError {
    /// No region was configured
    #[error("no region configured")]
    MissingRegion,

    /// The caller identity is not available
    #[error("caller identity unavailable: {0}")]
    Unavailable(String),

    /// The caller ARN did not carry an account field
    #[error("cannot extract account id from ARN: {0}")]
    MalformedArn(String),
}

/// Failure synchronizing tags
#[derive(Debug, Error)]
pub enum TagError {
    /// The ARN is not known to the tag store
    #[error("unknown resource ARN: {0}")]
    UnknownResource(String),

    /// The backing store failed
    #[error("backend error: {0}")]
    Backend(String),
}

/// A confirmation prompt failed (e.g. no terminal attached)
#[derive(Debug, Error)]
#[error("confirmation failed: {0}")]
pub struct ConfirmError(pub String);

/// Errors surfaced by a reconciliation pass
#[derive(Debug, Error)]
pub enum Error {
    /// A record failed boundary validation
    #[error("malformed option record: {reason}")]
    MalformedRecord { reason: String },

    /// The option group name breaks naming rules
    #[error("invalid option group name {name:?}: {}", .problems.join("; "))]
    InvalidName { name: String, problems: Vec<String> },

    /// An attribute that cannot change in place differs
    #[error("option group {name} requires replacement: {} changed", .fields.join(", "))]
    ReplacementRequired {
        name: String,
        fields: Vec<&'static str>,
    },

    #[error("failed to read state: {0}")]
    Read(#[from] ReadError),

    #[error("failed to apply options: {0}")]
    Apply(#[from] ApplyError),

    #[error("failed to synchronize tags: {0}")]
    Tag(#[from] TagError),

    #[error(transparent)]
    Confirm(#[from] ConfirmError),
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;
