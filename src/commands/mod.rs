// ABOUTME: Command module aggregator for the dockapp CLI.
// ABOUTME: Re-exports the deploy and show handlers and shared config resolution.

mod deploy;
mod runtime_connection;
mod show;

pub use deploy::deploy;
pub use show::show;

use dockapp::config::{DeployConfig, Overrides};
use dockapp::error::Result;
use std::path::Path;

/// File overrides, then flag overrides, over the defaults. A relative
/// `buildDir` is anchored at `cwd`.
pub fn resolve_config(
    cwd: &Path,
    explicit: Option<&Path>,
    flags: Overrides,
) -> Result<DeployConfig> {
    let file = match explicit {
        Some(path) => Overrides::load(&cwd.join(path))?,
        None => Overrides::discover(cwd)?,
    };

    let config = file.layer(flags).finalize()?;
    Ok(config.with_build_dir_under(cwd))
}
