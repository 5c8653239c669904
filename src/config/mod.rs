//! Configuration management module
//!
//! Handles the JSON settings document: its typed model, the role registry,
//! schema validation and locating the document on disk

pub mod persistence;
pub mod registry;
pub mod roles;
pub mod schema;
pub mod validation;
pub mod version;

use crate::error::ConfigError;
use crate::system::System;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use persistence::SettingsLocator;
pub use registry::Role;
pub use roles::{RoleSettings, Roles};
pub use version::{PulpVersion, VersionFamily};

/// Credentials used when the settings file names none
pub const DEFAULT_AUTH: (&str, &str) = ("admin", "admin");

/// Upper bound, and default, for task polling in seconds
pub const MAX_TASK_TIMEOUT: u32 = 1800;

/// Main settings structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Facts about the Pulp application as a whole
    pub pulp: PulpSection,

    /// Options for the test harness itself
    #[serde(default, skip_serializing_if = "GeneralSection::is_default")]
    pub general: GeneralSection,

    /// Hosts comprising the Pulp application, in document order
    pub hosts: Vec<Host>,
}

/// The `pulp` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PulpSection {
    pub version: PulpVersion,

    /// Username and password for the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<(String, String)>,

    /// Whether SELinux is enforced on the Pulp hosts
    #[serde(
        rename = "selinux enabled",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub selinux_enabled: Option<bool>,
}

impl PulpSection {
    #[must_use]
    #[inline]
    pub fn new(version: PulpVersion) -> Self {
        Self {
            version,
            auth: None,
            selinux_enabled: None,
        }
    }

    /// Configured credentials, or `admin`/`admin`
    #[must_use]
    #[inline]
    pub fn credentials(&self) -> (&str, &str) {
        self.auth
            .as_ref()
            .map_or(DEFAULT_AUTH, |(user, password)| (user.as_str(), password.as_str()))
    }

    /// SELinux is assumed on unless the file says otherwise
    #[must_use]
    #[inline]
    pub fn selinux_enabled(&self) -> bool {
        self.selinux_enabled.unwrap_or(true)
    }
}

/// The `general` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralSection {
    /// Seconds to wait for a Pulp task before giving up
    #[serde(default = "default_timeout")]
    pub timeout: u32,
}

impl GeneralSection {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

const fn default_timeout() -> u32 {
    MAX_TASK_TIMEOUT
}

/// One machine in the deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Host {
    pub hostname: String,

    #[serde(default)]
    pub roles: Roles,
}

impl Host {
    #[must_use]
    #[inline]
    pub fn new<S: Into<String>>(hostname: S, roles: Roles) -> Self {
        Self {
            hostname: hostname.into(),
            roles,
        }
    }

    #[must_use]
    #[inline]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }
}

impl Settings {
    /// Load and validate settings from an explicit file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not JSON, or fails
    /// schema validation
    #[inline]
    pub fn load_from_file(system: &dyn System, path: &Path) -> Result<Self, ConfigError> {
        SettingsLocator::new(system).load_from(path)
    }

    /// Validate a raw JSON document and convert it to typed settings
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Schema`] listing every violation
    #[inline]
    pub fn from_value(document: &serde_json::Value) -> Result<Self, ConfigError> {
        validation::validate(document)
    }

    /// Validate these settings against the schema
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Schema`] if the settings could not be written
    /// out and read back
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_settings(self)
    }

    #[must_use]
    #[inline]
    pub const fn family(&self) -> VersionFamily {
        self.pulp.version.family()
    }
}
