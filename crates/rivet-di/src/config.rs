//! Container configuration
//!
//! Sources are layered with the `config` crate: built-in defaults, then an
//! optional TOML document, then `RIVET_*` environment variables.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{DIError, DIResult};
use crate::lifetime::LifetimeKind;

/// Prefix of environment overrides, e.g. `RIVET_DEFAULT_LIFETIME=memory`
pub const ENV_PREFIX: &str = "RIVET";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Name used in log output
    pub name: String,
    /// Lifetime given to registrations that do not pick one
    pub default_lifetime: LifetimeKind,
    /// Log every container event at debug level
    pub trace_events: bool,
    /// Whether child containers start with the parent's listeners
    pub inherit_events: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "root".to_string(),
            default_lifetime: LifetimeKind::Transient,
            trace_events: true,
            inherit_events: false,
        }
    }
}

impl ContainerConfig {
    /// Defaults overlaid with a TOML document
    pub fn from_toml_str(toml: &str) -> DIResult<Self> {
        Self::layered(Some(toml), false)
    }

    /// Defaults overlaid with `RIVET_*` environment variables
    pub fn from_env() -> DIResult<Self> {
        Self::layered(None, true)
    }

    /// Defaults, then `toml` if given, then the environment
    pub fn load(toml: Option<&str>) -> DIResult<Self> {
        Self::layered(toml, true)
    }

    fn layered(toml: Option<&str>, env: bool) -> DIResult<Self> {
        let defaults = Config::try_from(&ContainerConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(toml) = toml {
            builder = builder.add_source(File::from_str(toml, FileFormat::Toml));
        }
        if env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            );
        }

        let config: ContainerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DIResult<()> {
        if self.name.trim().is_empty() {
            return Err(DIError::InvalidConfig(
                "container name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration inherited by a child container
    pub(crate) fn for_child(&self, inherit_events: bool) -> Self {
        Self {
            name: format!("{}/child", self.name),
            inherit_events,
            ..self.clone()
        }
    }
}
