// Option group lifecycle: plan, apply, destroy, show
pub mod option_group;

// Config validation, fingerprints and caller identity
pub mod inspect;

use anyhow::Result;

use crate::Context;
use crate::config::OptsyncConfig;
use crate::state::LocalPlane;

/// Load the user config from the resolved path
fn load_config(ctx: &Context) -> Result<OptsyncConfig> {
    OptsyncConfig::load(&ctx.config_file()?)
}

/// Open the local control plane from the resolved path
fn open_plane(ctx: &Context) -> Result<LocalPlane> {
    LocalPlane::open(&ctx.state_file()?)
}
