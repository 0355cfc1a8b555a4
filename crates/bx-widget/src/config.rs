//! Widget configuration.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `BX_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bx_actor::{InterfaceDescriptor, Network};
use bx_identity::{PemFileAuthorizer, DEFAULT_SESSION_TTL_SECS};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::format::{TotalFormat, DEFAULT_TOTAL_LABEL, DEFAULT_UNIT_LABEL};
use crate::notice::DEFAULT_ERROR_CLEAR_DELAY;
use crate::{Result, WidgetError};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "BX";

/// Configuration for the summary widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Network the aggregator is deployed on.
    pub network: Network,
    /// Replica URL; the network's default when unset.
    pub replica_url: Option<String>,
    /// Aggregator canister id, fixed at deployment.
    pub canister_id: Option<String>,
    /// Identity provider URL; the default `dfx` identity when unset.
    pub identity_provider: Option<String>,
    /// Lifetime of a new login session, in seconds.
    pub session_ttl_secs: i64,
    /// Time an error stays on display, in seconds.
    pub error_clear_secs: u64,
    /// Label in front of the total.
    pub total_label: String,
    /// Unit after the total.
    pub unit_label: String,
    /// Session file; `<config dir>/blockxpand/session.json` when unset.
    pub session_file: Option<PathBuf>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            replica_url: None,
            canister_id: None,
            identity_provider: None,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            error_clear_secs: DEFAULT_ERROR_CLEAR_DELAY.as_secs(),
            total_label: DEFAULT_TOTAL_LABEL.to_string(),
            unit_label: DEFAULT_UNIT_LABEL.to_string(),
            session_file: None,
        }
    }
}

impl WidgetConfig {
    /// Default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("blockxpand").join("widget.toml"))
    }

    /// Loads configuration from `path` (or the default location) and the
    /// process environment.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Config`] if a source cannot be parsed or the
    /// result is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        Self::load_with(path.as_deref(), Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads configuration from an optional file and an explicit environment
    /// source.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Config`] if a source cannot be parsed or the
    /// result is invalid.
    pub fn load_with(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            tracing::debug!(path = %path.display(), "Reading config file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let config: Self = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_secs <= 0 {
            return Err(WidgetError::Config(format!(
                "session_ttl_secs must be positive, got {}",
                self.session_ttl_secs
            )));
        }
        if let Some(url) = &self.replica_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(WidgetError::Config(format!(
                    "replica_url must be an http(s) URL, got {url:?}"
                )));
            }
        }
        Ok(())
    }

    /// The replica URL to connect to.
    #[must_use]
    pub fn replica_url(&self) -> &str {
        self.replica_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_url())
    }

    /// The aggregator's interface descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Config`] if no canister id is configured or it
    /// does not parse.
    pub fn descriptor(&self) -> Result<InterfaceDescriptor> {
        let canister_id = self
            .canister_id
            .as_deref()
            .ok_or_else(|| WidgetError::Config("canister_id is not set (BX_CANISTER_ID)".into()))?;
        InterfaceDescriptor::from_text(canister_id).map_err(WidgetError::Config)
    }

    /// The identity provider URL to log in with.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Config`] if none is configured and no default
    /// `dfx` identity location is known.
    pub fn identity_provider(&self) -> Result<String> {
        if let Some(url) = &self.identity_provider {
            return Ok(url.clone());
        }
        PemFileAuthorizer::default_dfx_identity()
            .map(|path| format!("file://{}", path.display()))
            .ok_or_else(|| {
                WidgetError::Config("identity_provider is not set (BX_IDENTITY_PROVIDER)".into())
            })
    }

    /// Lifetime of a new login session.
    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs)
    }

    /// Time an error stays on display.
    #[must_use]
    pub fn error_clear_delay(&self) -> Duration {
        Duration::from_secs(self.error_clear_secs)
    }

    /// The total's display format.
    #[must_use]
    pub fn total_format(&self) -> TotalFormat {
        TotalFormat::new(&self.total_label, &self.unit_label)
    }
}
