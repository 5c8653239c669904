//! Custom error types with exit codes

use crate::config::registry::Role;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Nature of a single schema violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ViolationKind {
    /// A required key is absent
    Missing,
    /// The value has the wrong JSON type
    WrongType,
    /// The key is not recognised at this position
    UnknownKey,
    /// The value is not one of the allowed literals
    InvalidEnumValue,
    /// The value has the right type but is out of range or malformed
    InvalidValue,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self {
            Self::Missing => "missing",
            Self::WrongType => "wrong type",
            Self::UnknownKey => "unknown key",
            Self::InvalidEnumValue => "invalid enum value",
            Self::InvalidValue => "invalid value",
        };
        f.write_str(label)
    }
}

/// One offending field in a settings document
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct SchemaViolation {
    /// Human-readable path, e.g. `hosts[0].roles["amqp broker"].service`
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl SchemaViolation {
    #[must_use]
    #[inline]
    pub fn new<P: Into<String>, M: Into<String>>(path: P, kind: ViolationKind, message: M) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "<document>"
        } else {
            self.path.as_str()
        };
        write!(f, "{path}: {} ({})", self.message, self.kind)
    }
}

/// Every violation found while validating one document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("settings failed validation{}", list_violations(.violations))]
pub struct SchemaError {
    violations: Vec<SchemaViolation>,
}

impl SchemaError {
    #[must_use]
    #[inline]
    pub const fn new(violations: Vec<SchemaViolation>) -> Self {
        Self { violations }
    }

    #[must_use]
    #[inline]
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }

    /// Whether any violation sits at `path` with the given kind
    #[must_use]
    #[inline]
    pub fn has(&self, path: &str, kind: ViolationKind) -> bool {
        self.violations
            .iter()
            .any(|v| v.path == path && v.kind == kind)
    }
}


/// Main error type for settings and topology operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The document does not match the settings schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Two hosts share a hostname
    #[error("duplicate host: '{hostname}' is declared more than once")]
    DuplicateHost { hostname: String },

    /// Required roles are not provided by any host
    #[error("the following roles are missing: {}", join_roles(.roles))]
    MissingRoles { roles: Vec<Role> },

    /// A singleton role query found no host
    #[error("no host declares the '{role}' role")]
    RoleNotFound { role: Role },

    /// No settings file exists in any searched location
    #[error(
        "unable to find a settings file; searched: {}",
        .searched.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
    )]
    NotFound { searched: Vec<PathBuf> },

    /// Reading or writing a settings file failed
    #[error("failed to access settings file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON
    #[error("failed to parse settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The schema generated from the role registry did not compile
    #[error("internal schema error: {message}")]
    InvalidSchema { message: String },
}

impl ConfigError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::InvalidSchema { .. } => 1,
            Self::Schema(_) | Self::Parse { .. } => 2,
            Self::DuplicateHost { .. } => 3,
            Self::MissingRoles { .. } => 4,
            Self::RoleNotFound { .. } => 5,
            Self::NotFound { .. } => 6,
            Self::Io { .. } => 7,
        }
    }

    /// Create an I/O error bound to a path
    #[inline]
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a JSON parse error bound to a path
    #[inline]
    pub fn parse<P: Into<PathBuf>>(path: P, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn list_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(|violation| format!("\n  - {violation}"))
        .collect()
}
