//! Execution engine - runs a reconciliation pass with terminal UI

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use reconcile::{
    ConfirmCallback, ConfirmError, PassOptions, PassOutcome, PassPhase, PassReport,
    ProgressCallback, ReconcileContext, TagOutcome, Tags, reconcile,
};

use crate::ui;

/// Options for execution (includes `yes` for confirmation skip)
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
}

/// Prints one line per apply call
#[derive(Debug, Default)]
pub struct UiProgress {
    quiet: bool,
}

impl UiProgress {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl ProgressCallback for UiProgress {
    fn on_phase(&mut self, phase: PassPhase) {
        log::debug!("Phase: {}", phase.label());
    }

    fn on_apply_start(&mut self, phase: PassPhase, count: usize) {
        if !self.quiet {
            println!(
                "  {} {} ({})...",
                "→".cyan(),
                capitalize(phase.label()),
                ui::count(count, "option")
            );
        }
    }

    fn on_apply_complete(&mut self, phase: PassPhase) {
        if !self.quiet {
            println!("    {} {}", "✓".green(), phase.label());
        }
    }
}

/// Asks once through dialoguer unless `--yes` was given
#[derive(Debug)]
pub struct PromptConfirm {
    yes: bool,
}

impl PromptConfirm {
    pub fn new(yes: bool) -> Self {
        Self { yes }
    }
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool, ConfirmError> {
        if self.yes {
            return Ok(true);
        }
        confirm_proceed(prompt).map_err(|e| ConfirmError(format!("{e:#}")))
    }
}

/// Run one reconciliation pass and print the outcome
pub fn execute(
    ctx: &ReconcileContext<'_>,
    desired_tags: &Tags,
    opts: &ExecuteOptions,
    quiet: bool,
) -> Result<PassReport> {
    let pass_opts = PassOptions {
        dry_run: opts.dry_run,
    };
    let report = reconcile(
        ctx,
        desired_tags,
        &pass_opts,
        &mut UiProgress::new(quiet),
        &mut PromptConfirm::new(opts.yes),
    )
    .with_context(|| format!("Failed to reconcile option group {}", ctx.resource_id))?;

    print_summary(ctx.resource_id, &report);
    Ok(report)
}

/// Confirm with user
pub fn confirm_proceed(prompt: &str) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(group: &str, report: &PassReport) {
    println!();
    match report.outcome {
        PassOutcome::DryRun => {
            println!("  {} Dry run - no changes made", "ℹ".blue());
            return;
        }
        PassOutcome::Declined => {
            println!("  {} Aborted", "✗".red());
            return;
        }
        PassOutcome::NoChange => {
            println!("  {} Options of {} already match", "✓".green(), group.bold());
        }
        PassOutcome::Applied => {
            if report.converged() {
                println!("  {} Option group {} reconciled", "✓".green().bold(), group.bold());
            } else {
                println!(
                    "  {} Option group {} applied but has not converged",
                    "⚠".yellow().bold(),
                    group.bold()
                );
            }
            if !report.delta.to_add.is_empty() {
                println!("    • {} added", ui::count(report.delta.to_add.len(), "option"));
            }
            if !report.delta.to_remove.is_empty() {
                println!(
                    "    • {} removed",
                    ui::count(report.delta.to_remove.len(), "option")
                );
            }
            if let Some(residual) = report.residual.as_ref().filter(|r| !r.is_empty()) {
                println!(
                    "    • {} still to add, {} still to remove",
                    residual.to_add.len().to_string().yellow(),
                    residual.to_remove.len().to_string().yellow()
                );
            }
        }
    }

    match &report.tags {
        TagOutcome::Synced(delta) if !delta.is_empty() => {
            println!(
                "    • {} set, {} removed",
                ui::count(delta.to_set.len(), "tag"),
                delta.to_remove.len()
            );
        }
        TagOutcome::Synced(_) => {}
        TagOutcome::Skipped { reason } => {
            println!("    {} Tags not synchronized: {}", "⚠".yellow(), reason);
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_confirm_with_yes_skips_prompt() {
        let mut confirm = PromptConfirm::new(true);
        assert!(confirm.confirm("Apply?").unwrap());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("applying additions"), "Applying additions");
        assert_eq!(capitalize(""), "");
    }
}
