// ABOUTME: Custom serde deserializers for override files.
// ABOUTME: Handles port binding maps and the container command.

use crate::types::ContainerPort;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Host ports are commonly quoted in YAML (`"9090"`), so accept both forms.
#[derive(Deserialize)]
#[serde(untagged)]
enum HostPortEntry {
    Number(u16),
    Text(String),
}

impl HostPortEntry {
    fn into_port(self) -> Result<u16, String> {
        let number = match self {
            HostPortEntry::Number(n) => n,
            HostPortEntry::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("invalid host port: {s:?}"))?,
        };
        if number == 0 {
            return Err("host port cannot be zero".to_string());
        }
        Ok(number)
    }
}

pub fn deserialize_port_bindings<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<ContainerPort, u16>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<BTreeMap<ContainerPort, HostPortEntry>> = Option::deserialize(deserializer)?;
    opt.map(|entries| {
        entries
            .into_iter()
            .map(|(port, host)| host.into_port().map(|host| (port, host)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(serde::de::Error::custom)
    })
    .transpose()
}

/// A command is either a list of arguments or a single program name.
#[derive(Deserialize)]
#[serde(untagged)]
enum CommandEntry {
    Single(String),
    Args(Vec<String>),
}

pub fn deserialize_command<'de, D>(deserializer: D) -> Result<Option<NonEmpty<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<CommandEntry> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(CommandEntry::Single(program)) => Ok(Some(NonEmpty::new(program))),
        Some(CommandEntry::Args(args)) => NonEmpty::from_vec(args)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("command cannot be empty")),
    }
}
