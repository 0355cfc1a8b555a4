//! Replica network selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which Internet Computer network the widget talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// A `dfx` replica on this machine.
    #[default]
    Local,
    /// A test deployment with its own root key.
    Test,
    /// The Internet Computer mainnet.
    #[serde(alias = "ic", alias = "mainnet")]
    Production,
}

impl Network {
    /// Whether the replica's root key must be fetched before calls can be
    /// verified. Only mainnet's key is built into the agent.
    #[must_use]
    pub fn requires_root_key(self) -> bool {
        !matches!(self, Self::Production)
    }

    /// Replica URL used when none is configured.
    #[must_use]
    pub fn default_url(self) -> &'static str {
        match self {
            Self::Local | Self::Test => "http://127.0.0.1:4943",
            Self::Production => "https://icp-api.io",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Test => write!(f, "test"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "test" => Ok(Self::Test),
            "production" | "ic" | "mainnet" => Ok(Self::Production),
            other => Err(format!("unknown network: {other}")),
        }
    }
}
