// ABOUTME: Container port keys in the engine's `<number>/<protocol>` form.
// ABOUTME: Parses bare numbers as TCP and orders ports numerically.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePortError {
    #[error("invalid port number: {0:?}")]
    InvalidNumber(String),

    #[error("port number cannot be zero")]
    Zero,

    #[error("unknown protocol: {0:?} (expected tcp, udp or sctp)")]
    UnknownProtocol(String),
}

/// Network protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Sctp => "sctp",
        }
    }
}

/// A port inside the container, e.g. `8080/tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerPort {
    number: u16,
    protocol: Protocol,
}

impl ContainerPort {
    pub const HTTP: ContainerPort = ContainerPort::tcp(80);
    pub const HTTPS: ContainerPort = ContainerPort::tcp(443);

    pub const fn tcp(number: u16) -> Self {
        Self {
            number,
            protocol: Protocol::Tcp,
        }
    }

    pub const fn new(number: u16, protocol: Protocol) -> Self {
        Self { number, protocol }
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

impl FromStr for ContainerPort {
    type Err = ParsePortError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (number, protocol) = match input.split_once('/') {
            Some((number, proto)) => {
                let protocol = match proto.to_ascii_lowercase().as_str() {
                    "tcp" => Protocol::Tcp,
                    "udp" => Protocol::Udp,
                    "sctp" => Protocol::Sctp,
                    _ => return Err(ParsePortError::UnknownProtocol(proto.to_string())),
                };
                (number, protocol)
            }
            None => (input, Protocol::Tcp),
        };

        let number: u16 = number
            .parse()
            .map_err(|_| ParsePortError::InvalidNumber(number.to_string()))?;
        if number == 0 {
            return Err(ParsePortError::Zero);
        }

        Ok(Self { number, protocol })
    }
}

impl fmt::Display for ContainerPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.protocol.as_str())
    }
}

/// YAML lets a port be written as `8080` or `"8080/udp"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum PortEntry {
    Number(u16),
    Text(String),
}

impl<'de> Deserialize<'de> for ContainerPort {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PortEntry::deserialize(deserializer)? {
            PortEntry::Number(0) => Err(serde::de::Error::custom(ParsePortError::Zero)),
            PortEntry::Number(n) => Ok(ContainerPort::tcp(n)),
            PortEntry::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
