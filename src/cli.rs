// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands, global flags, and the per-field overrides.

use clap::{Args, Parser, Subcommand};
use dockapp::config::{ConfigError, EnvValue, Overrides, parse_binding, parse_env_entry};
use dockapp::runtime::RuntimeType;
use dockapp::types::ContainerPort;
use nonempty::NonEmpty;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dockapp")]
#[command(about = "Rebuild, recreate and run a local build inside a Docker or Podman container")]
#[command(version)]
pub struct Cli {
    /// Log every engine call
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings, errors and the final result
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Overrides file to use instead of dockapp.yml
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a dockapp.yml template in the current directory
    Init {
        /// Target name to put in the template
        #[arg(long)]
        name: Option<String>,

        /// Image source to put in the template
        #[arg(long)]
        image: Option<String>,

        /// Overwrite an existing dockapp.yml
        #[arg(short, long)]
        force: bool,
    },

    /// Remove old containers, build or pull the image, then create, attach and start
    Deploy(DeployArgs),

    /// Print the configuration a deploy would use
    Show(OverrideArgs),
}

#[derive(Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Return once the container has started instead of streaming its output
    #[arg(short, long)]
    pub detach: bool,
}

/// Per-field overrides; each given flag replaces the file's value as a whole.
#[derive(Args, Default)]
pub struct OverrideArgs {
    /// Image tag, and the image stale containers are matched by
    #[arg(long)]
    pub name: Option<String>,

    /// Build-context directory or registry reference
    #[arg(long)]
    pub image: Option<String>,

    /// Extra port to expose, e.g. 8080 or 53/udp (repeatable)
    #[arg(short, long = "port", value_name = "PORT")]
    pub ports: Vec<ContainerPort>,

    /// Environment variable (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_env_arg)]
    pub env: Vec<(String, String)>,

    /// Publish a container port on a host port (repeatable)
    #[arg(short, long = "bind", value_name = "CONTAINER=HOST", value_parser = parse_binding_arg)]
    pub bind: Vec<(ContainerPort, u16)>,

    /// Host directory to mount at /root
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Cancel the deploy after this long, e.g. 5m
    #[arg(long, value_parser = humantime_serde::re::humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Container runtime to use instead of detecting one
    #[arg(long)]
    pub runtime: Option<RuntimeType>,

    /// Engine socket path
    #[arg(long, value_name = "PATH")]
    pub socket: Option<String>,

    /// Command to run in the container
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

fn parse_env_arg(entry: &str) -> Result<(String, String), ConfigError> {
    parse_env_entry(entry)
}

fn parse_binding_arg(entry: &str) -> Result<(ContainerPort, u16), ConfigError> {
    parse_binding(entry)
}

impl OverrideArgs {
    pub fn into_overrides(self) -> Overrides {
        Overrides {
            name: self.name,
            image: self.image,
            ports: (!self.ports.is_empty()).then_some(self.ports),
            env: (!self.env.is_empty()).then(|| {
                self.env
                    .into_iter()
                    .map(|(k, v)| (k, EnvValue::Literal(v)))
                    .collect()
            }),
            port_bind: (!self.bind.is_empty()).then(|| self.bind.into_iter().collect()),
            build_dir: self.build_dir,
            command: NonEmpty::from_vec(self.command),
            timeout: self.timeout,
            runtime: self.runtime,
            socket: self.socket,
        }
    }
}
