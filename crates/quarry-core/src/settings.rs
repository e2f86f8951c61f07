//! Process-wide defaults.
//!
//! A single [`Settings`] value holds the defaults every new search
//! configuration starts from: the index suffix, the target attribute, the
//! default adapter, the index-server endpoint, and the geo-anchor angle
//! convention.
//!
//! Configurations read the settings by value when they are constructed, so
//! [`init`] and [`reset`] only affect configurations built afterwards.
//!
//! ```rust
//! use quarry_core::settings::{self, Settings};
//!
//! settings::init(Settings {
//!     index_suffix: "_index".to_string(),
//!     ..Settings::default()
//! });
//! assert_eq!(settings::current().index_suffix, "_index");
//! settings::reset();
//! assert_eq!(settings::current().index_suffix, "_idx");
//! ```

use std::path::Path;
use std::sync::{OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::adapter::AdapterKind;
use crate::geo::AngleUnit;
use crate::{Error, Result};

/// Default suffix appended to bare index names.
pub const DEFAULT_INDEX_SUFFIX: &str = "_idx";

/// Default attribute holding a match's record identifier.
pub const DEFAULT_TARGET_ATTR: &str = "item_id";

/// Default index-server host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default index-server port.
pub const DEFAULT_PORT: u16 = 3312;

/// Index-server endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAddress {
    /// Host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerAddress {
    /// Create an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Process-wide search defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Suffix appended to index names that lack it.
    #[serde(default = "default_index_suffix")]
    pub index_suffix: String,

    /// Match attribute carrying the storage record identifier.
    #[serde(default = "default_target_attr")]
    pub target_attr: String,

    /// Adapter new configurations start with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_adapter: Option<AdapterKind>,

    /// Index-server endpoint.
    #[serde(default)]
    pub server: ServerAddress,

    /// Angle convention for geo-anchor coordinates.
    #[serde(default)]
    pub anchor_units: AngleUnit,
}

fn default_index_suffix() -> String {
    DEFAULT_INDEX_SUFFIX.to_string()
}

fn default_target_attr() -> String {
    DEFAULT_TARGET_ATTR.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_suffix: default_index_suffix(),
            target_attr: default_target_attr(),
            default_adapter: None,
            server: ServerAddress::default(),
            anchor_units: AngleUnit::default(),
        }
    }
}

impl Settings {
    /// Parse settings from a TOML document. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_toml_str(&content)
    }

    /// Render these settings as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.index_suffix.is_empty() {
            return Err(Error::config("index_suffix must not be empty"));
        }
        if self.target_attr.is_empty() {
            return Err(Error::config("target_attr must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Process-wide lifecycle
// ============================================================================

fn global() -> &'static RwLock<Settings> {
    static GLOBAL: OnceLock<RwLock<Settings>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(Settings::default()))
}

/// Replace the process-wide settings.
pub fn init(settings: Settings) {
    log::info!(
        "Initializing search settings (suffix '{}', target '{}', server {}:{})",
        settings.index_suffix,
        settings.target_attr,
        settings.server.host,
        settings.server.port
    );
    *global().write().unwrap_or_else(PoisonError::into_inner) = settings;
}

/// Restore the documented defaults.
pub fn reset() {
    log::info!("Resetting search settings to defaults");
    *global().write().unwrap_or_else(PoisonError::into_inner) = Settings::default();
}

/// A copy of the current process-wide settings.
pub fn current() -> Settings {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

// ============================================================================
// Tests
// ============================================================================
