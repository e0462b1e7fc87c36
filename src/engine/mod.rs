//! Execution engine for optsync
//!
//! The engine orchestrates:
//! 1. Planning - Compare a declared group against stored state
//! 2. Display - Show the delta, shadowed changes and tag changes
//! 3. Executing - Run the reconciliation pass with prompts and progress

pub mod differ;
pub mod executor;

pub use differ::{compute_plan, display_plan};
pub use executor::{ExecuteOptions, confirm_proceed, execute};
