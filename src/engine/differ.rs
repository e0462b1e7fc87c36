//! Plan computation and display

use colored::Colorize;
use reconcile::{
    CollectionSnapshot, ConfigReader, DiffSummary, OptionRecord, ReconciliationDelta, TagDelta,
    Tags, diff, diff_tags, replacement_fields, shadowed_changes,
};

use crate::config::DeclaredGroup;
use crate::state::GroupState;

/// Everything `plan` and `apply` show before touching state
#[derive(Debug, Clone)]
pub struct GroupPlan {
    pub group: String,
    /// Group does not exist yet and will be created first
    pub create: bool,
    pub delta: ReconciliationDelta,
    pub summary: DiffSummary,
    pub shadowed: Vec<String>,
    pub tags: TagDelta,
    /// Attributes that would need the group to be replaced
    pub replacement: Vec<&'static str>,
}

impl GroupPlan {
    /// Check if applying would change anything
    pub fn has_changes(&self) -> bool {
        self.create || !self.delta.is_empty() || !self.tags.is_empty()
    }

    /// Check if the group can be reconciled without replacement
    pub fn in_place(&self) -> bool {
        self.replacement.is_empty()
    }
}

/// Compare a declared group against what is stored
pub fn compute_plan(
    declared: &DeclaredGroup<'_>,
    stored: Option<&GroupState>,
) -> reconcile::Result<GroupPlan> {
    let desired = declared.read_desired()?;
    let empty = CollectionSnapshot::new();
    let previous = stored.map_or(&empty, |g| &g.options);

    let delta = diff(previous, &desired);
    let summary = DiffSummary::between(previous, &desired);
    let shadowed = shadowed_changes(previous, &desired);
    let no_tags = Tags::new();
    let tags = diff_tags(stored.map_or(&no_tags, |g| &g.tags), declared.tags());
    let replacement = stored
        .map(|g| replacement_fields(&g.spec(declared.name), &declared.spec()))
        .unwrap_or_default();

    Ok(GroupPlan {
        group: declared.name.to_string(),
        create: stored.is_none(),
        delta,
        summary,
        shadowed,
        tags,
        replacement,
    })
}

/// Display a plan as a box, like a diff
pub fn display_plan(plan: &GroupPlan) {
    if !plan.has_changes() && plan.shadowed.is_empty() && plan.in_place() {
        println!();
        println!("  {} {} is up to date", "✓".green(), plan.group.bold());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        format!("Option group {}", plan.group).bold()
    );
    println!("│");

    if plan.create {
        println!("│ {} {}", "+".green(), "(create option group)".dimmed());
        println!("│");
    }

    if !plan.in_place() {
        println!("│ {}", "Requires replacement".red().bold());
        for field in &plan.replacement {
            println!("│   {} {}", "!".red(), field);
        }
        println!("│");
    }

    if !plan.delta.is_empty() {
        println!("│ {}", "Options".bold());
        for record in sorted_additions(&plan.delta) {
            println!("│   {} {:<30} {}", "+".green(), record.label(), describe(record).dimmed());
        }
        let mut removals: Vec<&String> = plan.delta.to_remove.iter().collect();
        removals.sort();
        for name in removals {
            println!("│   {} {:<30} {}", "-".red(), name, "(will remove)".dimmed());
        }
        println!("│");
    }

    if !plan.shadowed.is_empty() {
        println!("│ {}", "Changed in place (not applied)".yellow().bold());
        for label in &plan.shadowed {
            println!("│   {} {}", "~".yellow(), label);
        }
        println!("│");
    }

    if !plan.tags.is_empty() {
        println!("│ {}", "Tags".bold());
        for (key, value) in &plan.tags.to_set {
            println!("│   {} {key} = {value}", "+".green());
        }
        for key in &plan.tags.to_remove {
            println!("│   {} {key}", "-".red());
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to add, {} to remove, {} unchanged",
        plan.summary.additions.to_string().green(),
        plan.summary.removals.to_string().red(),
        plan.summary.unchanged.to_string().dimmed()
    );
    println!("└─────────────────────────────────────────────────────┘");

    if !plan.shadowed.is_empty() {
        println!(
            "  {} Settings and memberships are compared by option name and port only; \
             remove and re-add an option to change them",
            "⚠".yellow()
        );
    }
}

fn sorted_additions(delta: &ReconciliationDelta) -> Vec<&OptionRecord> {
    let mut records: Vec<&OptionRecord> = delta.to_add.iter().collect();
    records.sort_by(|a, b| (&a.name, a.port).cmp(&(&b.name, b.port)));
    records
}

/// Short description of settings and memberships
fn describe(record: &OptionRecord) -> String {
    let mut parts = Vec::new();
    if !record.settings.is_empty() {
        let settings: Vec<String> = record
            .settings
            .iter()
            .map(|s| format!("{}={}", s.name, s.value))
            .collect();
        parts.push(settings.join(" "));
    }
    let groups = record.vpc_security_group_memberships.len() + record.db_security_group_memberships.len();
    if groups > 0 {
        parts.push(crate::ui::count(groups, "security group"));
    }
    parts.join(", ")
}
