//! Reconciliation pass - reads state, diffs, applies, syncs tags
//!
//! One pass runs strictly in sequence:
//! read current and desired, compute the delta, apply additions, apply
//! removals, synchronize tags, re-read. Nothing runs in parallel because the
//! control plane does not promise safe concurrent mutation of a resource.

use crate::context::{AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback, ReconcileContext};
use crate::diff::{diff, shadowed_changes};
use crate::error::Result;
use crate::types::{
    PassOptions, PassOutcome, PassPhase, PassReport, ReconciliationDelta, TagOutcome, Tags,
};

/// Run one reconciliation pass
///
/// # Arguments
/// * `ctx` - Collaborators and the resource id
/// * `desired_tags` - Tags the resource should carry after the pass
/// * `opts` - Pass options (dry_run)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback, asked once before applying
///
/// # Errors
/// Read and apply failures abort the pass and are returned unchanged; there
/// is no retry and no rollback. A failed ARN lookup only skips tag sync.
pub fn reconcile<P, C>(
    ctx: &ReconcileContext<'_>,
    desired_tags: &Tags,
    opts: &PassOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<PassReport>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    progress.on_phase(PassPhase::ComputeDelta);
    let previous = ctx.state.read_current(ctx.resource_id)?;
    let desired = ctx.desired.read_desired()?;

    let delta = diff(&previous, &desired);
    let shadowed = shadowed_changes(&previous, &desired);
    log::debug!(
        "Delta for {}: {} to add, {} to remove",
        ctx.resource_id,
        delta.to_add.len(),
        delta.to_remove.len()
    );
    for name in &shadowed {
        log::warn!("Option {name} changed settings or memberships; in-place changes are not applied");
    }

    let mut report = PassReport {
        outcome: PassOutcome::NoChange,
        delta,
        shadowed,
        tags: TagOutcome::Skipped {
            reason: "not attempted".to_string(),
        },
        arn: None,
        residual: None,
    };

    if opts.dry_run {
        report.outcome = PassOutcome::DryRun;
        report.tags = TagOutcome::Skipped {
            reason: "dry run".to_string(),
        };
        progress.on_phase(PassPhase::Done);
        return Ok(report);
    }

    if report.delta.is_empty() {
        progress.on_phase(PassPhase::NoChange);
    } else {
        let prompt = format!(
            "Apply {} option changes to {}?",
            report.delta.total(),
            ctx.resource_id
        );
        if !confirm.confirm(&prompt)? {
            report.outcome = PassOutcome::Declined;
            report.tags = TagOutcome::Skipped {
                reason: "declined".to_string(),
            };
            progress.on_phase(PassPhase::Done);
            return Ok(report);
        }

        apply_delta(ctx, &report.delta, progress)?;
        report.outcome = PassOutcome::Applied;
    }

    progress.on_phase(PassPhase::SyncTags);
    match ctx.identity.resource_arn(ctx.resource_id) {
        Ok(arn) => {
            let applied = ctx.tags.sync_tags(&arn, desired_tags)?;
            report.tags = TagOutcome::Synced(applied);
            report.arn = Some(arn);
        }
        Err(e) => {
            log::debug!(
                "Error building ARN for option group {}, not setting tags: {e}",
                ctx.resource_id
            );
            report.tags = TagOutcome::Skipped {
                reason: e.to_string(),
            };
        }
    }

    if report.outcome == PassOutcome::Applied {
        let after = ctx.state.read_current(ctx.resource_id)?;
        let residual = diff(&after, &desired);
        if !residual.is_empty() {
            log::warn!(
                "Option group {} has not converged: {} to add, {} to remove",
                ctx.resource_id,
                residual.to_add.len(),
                residual.to_remove.len()
            );
        }
        report.residual = Some(residual);
    }

    progress.on_phase(PassPhase::Done);
    Ok(report)
}

/// Apply additions, then removals, skipping empty batches
fn apply_delta<P: ProgressCallback>(
    ctx: &ReconcileContext<'_>,
    delta: &ReconciliationDelta,
    progress: &mut P,
) -> Result<()> {
    if !delta.to_add.is_empty() {
        progress.on_phase(PassPhase::ApplyAdditions);
        progress.on_apply_start(PassPhase::ApplyAdditions, delta.to_add.len());
        log::info!(
            "Including {} options in {}",
            delta.to_add.len(),
            ctx.resource_id
        );
        ctx.applier.apply_additions(ctx.resource_id, &delta.to_add)?;
        progress.on_apply_complete(PassPhase::ApplyAdditions);
    }

    if !delta.to_remove.is_empty() {
        progress.on_phase(PassPhase::ApplyRemovals);
        progress.on_apply_start(PassPhase::ApplyRemovals, delta.to_remove.len());
        log::info!(
            "Removing {} options from {}",
            delta.to_remove.len(),
            ctx.resource_id
        );
        ctx.applier.apply_removals(ctx.resource_id, &delta.to_remove)?;
        progress.on_apply_complete(PassPhase::ApplyRemovals);
    }

    Ok(())
}

/// Simple pass without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn reconcile_simple(
    ctx: &ReconcileContext<'_>,
    desired_tags: &Tags,
    opts: &PassOptions,
) -> Result<PassReport> {
    reconcile(ctx, desired_tags, opts, &mut NoProgress, &mut AutoConfirm)
}
