//! Option group commands
//!
//! - `plan` - Show what apply would change
//! - `apply` - Create the group if needed, then run a reconciliation pass
//! - `destroy` - Delete a group from state
//! - `show` - Print stored groups

use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use reconcile::{
    AccountLookup, ArnResolver, PassReport, ReconcileContext, StaticAccount, ensure_in_place,
};
use std::collections::BTreeMap;

use super::{load_config, open_plane};
use crate::Context;
use crate::config::OptsyncConfig;
use crate::engine::{self, ExecuteOptions};
use crate::state::{GroupState, LocalPlane};
use crate::ui;

/// Show the plan for a declared group
pub fn plan(ctx: &Context, group: Option<&str>) -> Result<()> {
    let config = load_config(ctx)?;
    let declared = config.group(group)?;
    declared.validate()?;

    let plane = open_plane(ctx)?;
    let stored = plane.group(declared.name);
    let plan = engine::compute_plan(&declared, stored.as_ref())?;
    engine::display_plan(&plan);

    if !plan.in_place() {
        ui::warn(&format!(
            "Apply will refuse to change {}; run `optsync destroy {}` first",
            plan.replacement.join(", "),
            declared.name
        ));
    }
    Ok(())
}

/// Reconcile a declared group
pub fn apply(ctx: &Context, group: Option<&str>, dry_run: bool, yes: bool) -> Result<()> {
    let config = load_config(ctx)?;
    let declared = config.group(group)?;
    declared.validate()?;

    let plane = open_plane(ctx)?;
    let stored = plane.group(declared.name);
    let plan = engine::compute_plan(&declared, stored.as_ref())?;

    if !ctx.quiet {
        engine::display_plan(&plan);
    }

    if let Some(stored) = &stored {
        ensure_in_place(&stored.spec(declared.name), &declared.spec()).with_context(|| {
            format!(
                "Run `optsync destroy {}` and apply again to replace it",
                declared.name
            )
        })?;
    }

    let mut confirmed = yes;
    if plan.create {
        if dry_run {
            println!();
            println!("  {} Dry run - option group would be created", "ℹ".blue());
            return Ok(());
        }
        if !confirmed
            && !engine::confirm_proceed(&format!("Create option group {}?", declared.name))?
        {
            println!();
            println!("  {} Aborted", "✗".red());
            return Ok(());
        }
        plane.create_group(&declared.spec(), declared.tags())?;
        confirmed = true;
    }

    let identity = ArnResolver::new(config.region.clone(), account_lookup(&config, &plane));
    let rctx = ReconcileContext {
        resource_id: declared.name,
        state: &plane,
        desired: &declared,
        applier: &plane,
        identity: &identity,
        tags: &plane,
    };
    let opts = ExecuteOptions {
        dry_run,
        yes: confirmed,
    };

    let report = engine::execute(&rctx, declared.tags(), &opts, ctx.quiet)?;
    if let Some(arn) = &report.arn {
        log::info!("Option group ARN: {arn}");
    }
    ensure_converged(declared.name, &report)
}

/// Fail when the re-read state still differs from the declaration
fn ensure_converged(name: &str, report: &PassReport) -> Result<()> {
    if !report.converged() {
        bail!("Option group {name} did not converge after apply");
    }
    Ok(())
}

/// Delete a group from state
pub fn destroy(ctx: &Context, name: &str, yes: bool) -> Result<()> {
    let plane = open_plane(ctx)?;
    let Some(stored) = plane.group(name) else {
        ui::warn(&format!("Option group {name} does not exist"));
        return Ok(());
    };

    if !yes {
        println!(
            "  {} {} with {}",
            "-".red(),
            name.bold(),
            ui::count(stored.options.len(), "option")
        );
        if !engine::confirm_proceed(&format!("Destroy option group {name}?"))? {
            println!("  {} Aborted", "✗".red());
            return Ok(());
        }
    }

    plane.delete_group(name)?;
    ui::success(&format!("Destroyed option group {name}"));
    Ok(())
}

/// Print one stored group, or all of them
pub fn show(ctx: &Context, group: Option<&str>, json: bool) -> Result<()> {
    let plane = open_plane(ctx)?;

    let mut groups = BTreeMap::new();
    match group {
        Some(name) => {
            let stored = plane
                .group(name)
                .with_context(|| format!("Option group {name} does not exist"))?;
            groups.insert(name.to_string(), stored);
        }
        None => {
            for name in plane.group_names() {
                if let Some(stored) = plane.group(&name) {
                    groups.insert(name, stored);
                }
            }
        }
    }

    if json {
        let out = serde_json::to_string_pretty(&groups).context("Failed to serialize state")?;
        println!("{out}");
        return Ok(());
    }

    if groups.is_empty() {
        ui::info(&format!(
            "No option groups in {}",
            plane.path().display()
        ));
        return Ok(());
    }

    for (name, stored) in &groups {
        print_group(name, stored, ctx.verbose > 0);
    }
    Ok(())
}

fn print_group(name: &str, group: &GroupState, fingerprints: bool) {
    ui::header(&format!("Option group {name}"));
    ui::kv("engine", &format!("{} {}", group.engine_name, group.major_engine_version));
    ui::kv("description", &group.description);
    ui::kv("created", &group.created_at.to_rfc3339());
    if let Some(arn) = &group.arn {
        ui::kv("arn", arn);
    }

    println!();
    println!("  {}", ui::count(group.options.len(), "option").bold());
    for record in group.options.sorted() {
        if fingerprints {
            let fingerprint = record.fingerprint().to_string();
            println!("    {:<30} {}", record.label(), fingerprint.dimmed());
        } else {
            println!("    {}", record.label());
        }
        for setting in &record.settings {
            ui::dim(&format!("    {} = {}", setting.name, setting.value));
        }
        for sg in record
            .vpc_security_group_memberships
            .iter()
            .chain(&record.db_security_group_memberships)
        {
            ui::dim(&format!("    member of {sg}"));
        }
    }

    if !group.tags.is_empty() {
        println!();
        println!("  {}", ui::count(group.tags.len(), "tag").bold());
        for (key, value) in &group.tags {
            ui::dim(&format!("{key} = {value}"));
        }
    }
}

/// Fixed account id from config, or the caller recorded in state
fn account_lookup<'a>(config: &OptsyncConfig, plane: &'a LocalPlane) -> Box<dyn AccountLookup + 'a> {
    match &config.account_id {
        Some(id) => Box::new(StaticAccount(id.clone())),
        None => Box::new(plane),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{
        Error, Fingerprint, IdentityResolver, LookupError, OptionRecord, PassOutcome,
        ReconciliationDelta, TagOutcome, Tags,
    };
    use std::fs;
    use tempfile::TempDir;

    const MEMCACHED_11211: &str = r#"
[option_groups.og]
engine_name = "mysql"
major_engine_version = "5.6"
description = "app"
tags = { env = "prod" }

[[option_groups.og.option]]
option_name = "MEMCACHED"
port = 11211
"#;

    fn write_config(dir: &TempDir, content: &str) {
        fs::write(dir.path().join("config.toml"), content).unwrap();
    }

    fn test_context(dir: &TempDir) -> Context {
        Context {
            verbose: 0,
            quiet: true,
            config_path: Some(dir.path().join("config.toml")),
            state_path: Some(dir.path().join("state.toml")),
        }
    }

    fn stored(dir: &TempDir) -> Option<GroupState> {
        LocalPlane::open(&dir.path().join("state.toml"))
            .unwrap()
            .group("og")
    }

    fn prod_tags() -> Tags {
        Tags::from([("env".to_string(), "prod".to_string())])
    }

    #[test]
    fn test_apply_creates_group_with_declared_tags() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, MEMCACHED_11211);
        let ctx = test_context(&dir);

        apply(&ctx, None, false, true).unwrap();

        let group = stored(&dir).unwrap();
        assert_eq!(group.tags, prod_tags());
        assert_eq!(group.options.len(), 1);
        assert!(group.arn.is_none());
    }

    #[test]
    fn test_apply_dry_run_creates_nothing() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, MEMCACHED_11211);

        apply(&test_context(&dir), None, true, true).unwrap();

        assert!(stored(&dir).is_none());
    }

    #[test]
    fn test_apply_moves_option_to_new_port() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, MEMCACHED_11211);
        let ctx = test_context(&dir);
        apply(&ctx, None, false, true).unwrap();

        write_config(&dir, &MEMCACHED_11211.replace("11211", "11212"));
        apply(&ctx, None, false, true).unwrap();

        let group = stored(&dir).unwrap();
        assert_eq!(group.options.len(), 1);
        assert!(
            group
                .options
                .contains(&Fingerprint::of("MEMCACHED", Some(11212)))
        );
    }

    #[test]
    fn test_apply_refuses_replacement() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, MEMCACHED_11211);
        let ctx = test_context(&dir);
        apply(&ctx, None, false, true).unwrap();

        write_config(
            &dir,
            &MEMCACHED_11211
                .replace("\"5.6\"", "\"5.7\"")
                .replace("11211", "11212"),
        );
        let err = apply(&ctx, None, false, true).unwrap_err();

        match err.downcast_ref::<Error>() {
            Some(Error::ReplacementRequired { fields, .. }) => {
                assert_eq!(fields, &vec!["major_engine_version"]);
            }
            other => panic!("expected ReplacementRequired, got {other:?}"),
        }
        let group = stored(&dir).unwrap();
        assert_eq!(group.major_engine_version, "5.6");
        assert!(
            group
                .options
                .contains(&Fingerprint::of("MEMCACHED", Some(11211)))
        );
    }

    #[test]
    fn test_apply_syncs_tags_when_identity_resolves() {
        let dir = TempDir::new().unwrap();
        let config = format!(
            "region = \"us-west-2\"\naccount_id = \"123456789012\"\n{MEMCACHED_11211}"
        );
        write_config(&dir, &config);
        let ctx = test_context(&dir);
        apply(&ctx, None, false, true).unwrap();

        write_config(&dir, &config.replace("env = \"prod\"", "team = \"db\""));
        apply(&ctx, None, false, true).unwrap();

        let group = stored(&dir).unwrap();
        assert_eq!(
            group.tags,
            Tags::from([("team".to_string(), "db".to_string())])
        );
        assert_eq!(
            group.arn.as_deref(),
            Some("arn:aws:rds:us-west-2:123456789012:og:og")
        );
    }

    #[test]
    fn test_destroy_removes_group() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, MEMCACHED_11211);
        let ctx = test_context(&dir);
        apply(&ctx, None, false, true).unwrap();

        destroy(&ctx, "og", true).unwrap();
        assert!(stored(&dir).is_none());

        destroy(&ctx, "og", true).unwrap();
    }

    #[test]
    fn test_residual_is_an_error() {
        let mut report = PassReport {
            outcome: PassOutcome::Applied,
            delta: ReconciliationDelta::default(),
            shadowed: Vec::new(),
            tags: TagOutcome::Skipped {
                reason: "no region configured".into(),
            },
            arn: None,
            residual: Some(ReconciliationDelta::default()),
        };
        assert!(ensure_converged("og", &report).is_ok());

        report.residual = Some(ReconciliationDelta {
            to_add: vec![OptionRecord::new("MEMCACHED").with_port(11211)],
            to_remove: Vec::new(),
        });
        let err = ensure_converged("og", &report).unwrap_err();
        assert!(err.to_string().contains("did not converge"));
    }

    #[test]
    fn test_show_reads_state() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, MEMCACHED_11211);
        let ctx = test_context(&dir);
        apply(&ctx, None, false, true).unwrap();

        show(&ctx, Some("og"), true).unwrap();
        assert!(show(&ctx, Some("missing"), false).is_err());
        assert!(dir.path().join("state.toml").exists());
    }

    #[test]
    fn test_account_lookup_prefers_config() {
        let dir = TempDir::new().unwrap();
        let plane = LocalPlane::open(&dir.path().join("state.toml")).unwrap();
        plane
            .set_caller_arn(Some("arn:aws:iam::111111111111:user/a".into()))
            .unwrap();

        let mut config = OptsyncConfig {
            region: "us-west-2".into(),
            ..OptsyncConfig::default()
        };
        let resolver = ArnResolver::new(config.region.clone(), account_lookup(&config, &plane));
        assert_eq!(
            resolver.resource_arn("og").unwrap(),
            "arn:aws:rds:us-west-2:111111111111:og:og"
        );

        config.account_id = Some("222222222222".into());
        let resolver = ArnResolver::new(config.region.clone(), account_lookup(&config, &plane));
        assert_eq!(
            resolver.resource_arn("og").unwrap(),
            "arn:aws:rds:us-west-2:222222222222:og:og"
        );
    }

    #[test]
    fn test_account_lookup_without_identity() {
        let dir = TempDir::new().unwrap();
        let plane = LocalPlane::open(&dir.path().join("state.toml")).unwrap();
        let config = OptsyncConfig {
            region: "us-west-2".into(),
            ..OptsyncConfig::default()
        };
        let resolver = ArnResolver::new(config.region.clone(), account_lookup(&config, &plane));
        assert!(matches!(
            resolver.resource_arn("og"),
            Err(LookupError::Unavailable(_))
        ));
    }
}
