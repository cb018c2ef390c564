// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates a commented dockapp.yml template.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::TargetName;

use super::{CONFIG_FILENAME, ConfigError, DEFAULT_IMAGE, DEFAULT_NAME};

pub fn init_config(dir: &Path, name: Option<&str>, image: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let name = TargetName::new(name.unwrap_or(DEFAULT_NAME)).map_err(ConfigError::from)?;
    let image = image.unwrap_or(DEFAULT_IMAGE);
    if image.trim().is_empty() {
        return Err(ConfigError::EmptyImage.into());
    }

    std::fs::write(&config_path, template_yaml(&name, image))?;

    Ok(())
}

fn template_yaml(name: &TargetName, image: &str) -> String {
    format!(
        r#"# Image tag, and the image stale containers are matched by
name: {name}
# Build-context directory (with a Dockerfile) or registry reference
image: {image}
# Exposed in addition to 80/tcp and 443/tcp
ports: []
env: {{}}
# Container port to host port, e.g. "8080/tcp": "9090"
portBind: {{}}
# Host directory mounted at /root
# buildDir: out
command: [node, app.js]
# timeout: 10m
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Overrides;

    #[test]
    fn template_parses_back() {
        let name = TargetName::new("app:test").unwrap();
        let overrides = Overrides::from_yaml(&template_yaml(&name, "./docker")).unwrap();
        let config = overrides.finalize().unwrap();
        assert_eq!(config.name.as_str(), "app:test");
        assert_eq!(config.image, "./docker");
        assert_eq!(config.command, vec!["node", "app.js"]);
    }
}
