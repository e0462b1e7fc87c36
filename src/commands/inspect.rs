use anyhow::{Result, bail};
use colored::Colorize;
use reconcile::{Fingerprint, OptionRecord, account_from_arn};

use super::{load_config, open_plane};
use crate::Context;
use crate::ui;

/// Validate every declared group in the config file
pub fn validate(ctx: &Context) -> Result<()> {
    let path = ctx.config_file()?;
    let config = load_config(ctx)?;

    let problems = config.problems();
    for problem in &problems {
        ui::error(problem);
    }
    if !problems.is_empty() {
        bail!(
            "{} in {}",
            ui::count(problems.len(), "problem"),
            path.display()
        );
    }

    if config.region.is_empty() {
        ui::warn("No region configured; tags will not be synchronized");
    }
    ui::success(&format!(
        "{} valid in {}",
        ui::count(config.option_groups.len(), "option group"),
        path.display()
    ));
    Ok(())
}

/// Print the identity fingerprint of an option
pub fn fingerprint(ctx: &Context, name: &str, port: Option<u32>) -> Result<()> {
    let fingerprint = Fingerprint::of(name, port);
    if ctx.quiet {
        println!("{fingerprint}");
        return Ok(());
    }

    let mut record = OptionRecord::new(name);
    record.port = port;
    println!("{} {}", record.label().bold(), fingerprint.to_string().dimmed());
    Ok(())
}

/// Show, record or clear the caller identity
pub fn identity(ctx: &Context, arn: Option<String>, clear: bool) -> Result<()> {
    let plane = open_plane(ctx)?;

    if clear {
        plane.set_caller_arn(None)?;
        ui::success("Cleared caller identity");
        return Ok(());
    }

    match arn {
        Some(arn) => {
            let account = account_from_arn(&arn)?.to_string();
            plane.set_caller_arn(Some(arn))?;
            ui::success(&format!("Recorded caller identity for account {account}"));
        }
        None => match plane.recorded_caller() {
            Some(arn) => ui::kv("caller", &arn),
            None => ui::info("No caller identity recorded"),
        },
    }
    Ok(())
}
