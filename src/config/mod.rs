// ABOUTME: Deployment configuration: defaults, override files and validation.
// ABOUTME: Overrides replace defaults field by field and finalize into a DeployConfig.

mod deserialize;
mod env_value;
mod error;
mod init;

pub use env_value::{EnvValue, resolve_env_map};
pub use error::ConfigError;
pub use init::init_config;

use crate::error::{Error, Result};
use crate::runtime::{RuntimeConfig, RuntimeType};
use crate::types::{ContainerPort, TargetName};
use deserialize::{deserialize_command, deserialize_port_bindings};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "dockapp.yml";
pub const CONFIG_FILENAME_ALT: &str = "dockapp.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".dockapp/config.yml";

pub const DEFAULT_NAME: &str = "dockapp:default";
pub const DEFAULT_IMAGE: &str = "./docker";
pub const DEFAULT_COMMAND: [&str; 2] = ["node", "app.js"];

/// Where `buildDir` is mounted inside the container.
pub const BUILD_DIR_TARGET: &str = "/root";

/// Caller-supplied settings. Every present field replaces its default as a
/// whole; maps and lists are never merged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Overrides {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub ports: Option<Vec<ContainerPort>>,

    #[serde(default)]
    pub env: Option<HashMap<String, EnvValue>>,

    #[serde(default, deserialize_with = "deserialize_port_bindings")]
    pub port_bind: Option<BTreeMap<ContainerPort, u16>>,

    #[serde(default)]
    pub build_dir: Option<PathBuf>,

    #[serde(default, deserialize_with = "deserialize_command")]
    pub command: Option<NonEmpty<String>>,

    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,

    #[serde(default)]
    pub runtime: Option<RuntimeType>,

    #[serde(default)]
    pub socket: Option<String>,
}

impl Overrides {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// First override file present in `dir`, if any.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        [CONFIG_FILENAME, CONFIG_FILENAME_ALT, CONFIG_FILENAME_DIR]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Load the override file found in `dir`; no file means no overrides.
    pub fn discover(dir: &Path) -> Result<Self> {
        match Self::find(dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading overrides");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply `over` on top of `self`, field by field.
    pub fn layer(self, over: Overrides) -> Overrides {
        Overrides {
            name: over.name.or(self.name),
            image: over.image.or(self.image),
            ports: over.ports.or(self.ports),
            env: over.env.or(self.env),
            port_bind: over.port_bind.or(self.port_bind),
            build_dir: over.build_dir.or(self.build_dir),
            command: over.command.or(self.command),
            timeout: over.timeout.or(self.timeout),
            runtime: over.runtime.or(self.runtime),
            socket: over.socket.or(self.socket),
        }
    }

    /// Fill in defaults, resolve env references and validate.
    pub fn finalize(self) -> std::result::Result<DeployConfig, ConfigError> {
        let name = TargetName::new(self.name.as_deref().unwrap_or(DEFAULT_NAME))?;

        let env = match &self.env {
            Some(env) => resolve_env_map(env)?,
            None => BTreeMap::new(),
        };

        let config = DeployConfig {
            name,
            image: self.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
            ports: self.ports.unwrap_or_default(),
            env,
            port_bind: self.port_bind.unwrap_or_default(),
            build_dir: self.build_dir,
            command: self
                .command
                .map(Vec::from)
                .unwrap_or_else(default_command),
            timeout: self.timeout,
            runtime: RuntimeConfig {
                runtime: self.runtime,
                socket: self.socket,
            },
        };

        config.validate()?;
        Ok(config)
    }
}

fn default_command() -> Vec<String> {
    DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect()
}

/// The finalized, immutable settings of one deployment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Image tag and the key stale containers are matched by.
    pub name: TargetName,
    /// Build-context directory or registry reference.
    pub image: String,
    /// Extra ports to expose besides 80/tcp and 443/tcp.
    pub ports: Vec<ContainerPort>,
    pub env: BTreeMap<String, String>,
    /// Container port to host port.
    pub port_bind: BTreeMap<ContainerPort, u16>,
    /// Host directory mounted at `/root`.
    pub build_dir: Option<PathBuf>,
    pub command: Vec<String>,
    /// Give up on the whole run after this long.
    pub timeout: Option<Duration>,
    pub runtime: RuntimeConfig,
}

impl DeployConfig {
    /// Defaults for everything but the target name.
    pub fn new(name: TargetName) -> Self {
        Self {
            name,
            image: DEFAULT_IMAGE.to_string(),
            ports: Vec::new(),
            env: BTreeMap::new(),
            port_bind: BTreeMap::new(),
            build_dir: None,
            command: default_command(),
            timeout: None,
            runtime: RuntimeConfig::default(),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.image.trim().is_empty() {
            return Err(ConfigError::EmptyImage);
        }
        if self.command.is_empty() {
            return Err(ConfigError::EmptyCommand);
        }
        Ok(())
    }

    /// Make a relative `build_dir` absolute against `base`. Engines read a
    /// relative bind source as a named volume.
    pub fn with_build_dir_under(mut self, base: &Path) -> Self {
        self.build_dir = self.build_dir.map(|dir| {
            if dir.is_relative() {
                base.join(dir)
            } else {
                dir
            }
        });
        self
    }
}

/// Parse a `KEY=VALUE` command-line entry.
pub fn parse_env_entry(entry: &str) -> std::result::Result<(String, String), ConfigError> {
    match entry.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidEnvEntry(entry.to_string())),
    }
}

/// Parse a `CONTAINER=HOST` command-line port binding, e.g. `8080/tcp=9090`.
pub fn parse_binding(entry: &str) -> std::result::Result<(ContainerPort, u16), ConfigError> {
    let (container, host) = entry
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidBinding(entry.to_string()))?;
    let container: ContainerPort = container.parse()?;
    let host: u16 = host
        .trim()
        .parse()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ConfigError::InvalidBinding(entry.to_string()))?;
    Ok((container, host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_finalize_to_defaults() {
        let config = Overrides::default().finalize().unwrap();
        assert_eq!(config.name.as_str(), "dockapp:default");
        assert_eq!(config.image, "./docker");
        assert!(config.ports.is_empty());
        assert!(config.env.is_empty());
        assert!(config.port_bind.is_empty());
        assert_eq!(config.build_dir, None);
        assert_eq!(config.command, vec!["node", "app.js"]);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn layer_replaces_whole_fields() {
        let file = Overrides::from_yaml(
            r#"
name: app:file
env:
  A: "1"
  B: "2"
ports: [3000]
"#,
        )
        .unwrap();
        let cli = Overrides {
            env: Some(HashMap::from([("C".to_string(), EnvValue::from("3"))])),
            ..Default::default()
        };

        let config = file.layer(cli).finalize().unwrap();
        assert_eq!(config.name.as_str(), "app:file");
        assert_eq!(config.ports, vec![ContainerPort::tcp(3000)]);
        assert_eq!(
            config.env,
            BTreeMap::from([("C".to_string(), "3".to_string())])
        );
    }

    #[test]
    fn empty_image_is_rejected() {
        let overrides = Overrides {
            image: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            overrides.finalize(),
            Err(ConfigError::EmptyImage)
        ));
    }

    #[test]
    fn empty_name_is_rejected() {
        let overrides = Overrides {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            overrides.finalize(),
            Err(ConfigError::InvalidName(_))
        ));
    }

    #[test]
    fn relative_build_dir_is_anchored() {
        let mut config = DeployConfig::new(TargetName::new("app:test").unwrap());
        config.build_dir = Some(PathBuf::from("out"));
        let config = config.with_build_dir_under(Path::new("/work"));
        assert_eq!(config.build_dir, Some(PathBuf::from("/work/out")));
    }

    #[test]
    fn absolute_build_dir_is_kept() {
        let mut config = DeployConfig::new(TargetName::new("app:test").unwrap());
        config.build_dir = Some(PathBuf::from("/srv/out"));
        let config = config.with_build_dir_under(Path::new("/work"));
        assert_eq!(config.build_dir, Some(PathBuf::from("/srv/out")));
    }

    #[test]
    fn env_entry_splits_on_first_equals() {
        assert_eq!(
            parse_env_entry("URL=a=b").unwrap(),
            ("URL".to_string(), "a=b".to_string())
        );
        assert!(parse_env_entry("=x").is_err());
        assert!(parse_env_entry("NOVALUE").is_err());
    }

    #[test]
    fn binding_parses_container_and_host() {
        assert_eq!(
            parse_binding("8080=9090").unwrap(),
            (ContainerPort::tcp(8080), 9090)
        );
        assert!(matches!(
            parse_binding("8080/tcp=0"),
            Err(ConfigError::InvalidBinding(_))
        ));
        assert!(matches!(
            parse_binding("8080/xyz=80"),
            Err(ConfigError::InvalidPort(_))
        ));
    }
}
