//! Role registry
//!
//! The single table describing which roles exist, which settings each role
//! accepts, and which roles a Pulp deployment needs for each version family.
//! Both the schema generator and the topology resolver read from here.

use crate::config::version::VersionFamily;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A named capability a host may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Role {
    #[serde(rename = "amqp broker")]
    AmqpBroker,
    #[serde(rename = "api")]
    Api,
    #[serde(rename = "content")]
    Content,
    #[serde(rename = "mongod")]
    Mongod,
    #[serde(rename = "pulp celerybeat")]
    PulpCelerybeat,
    #[serde(rename = "pulp cli")]
    PulpCli,
    #[serde(rename = "pulp resource manager")]
    PulpResourceManager,
    #[serde(rename = "pulp workers")]
    PulpWorkers,
    #[serde(rename = "redis")]
    Redis,
    #[serde(rename = "shell")]
    Shell,
    #[serde(rename = "squid")]
    Squid,
}

impl Role {
    /// Every recognised role, in configuration-name order
    pub const ALL: [Self; 11] = [
        Self::AmqpBroker,
        Self::Api,
        Self::Content,
        Self::Mongod,
        Self::PulpCelerybeat,
        Self::PulpCli,
        Self::PulpResourceManager,
        Self::PulpWorkers,
        Self::Redis,
        Self::Shell,
        Self::Squid,
    ];

    /// Name used for this role in settings files
    #[must_use]
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::AmqpBroker => "amqp broker",
            Self::Api => "api",
            Self::Content => "content",
            Self::Mongod => "mongod",
            Self::PulpCelerybeat => "pulp celerybeat",
            Self::PulpCli => "pulp cli",
            Self::PulpResourceManager => "pulp resource manager",
            Self::PulpWorkers => "pulp workers",
            Self::Redis => "redis",
            Self::Shell => "shell",
            Self::Squid => "squid",
        }
    }

    /// Sub-keys accepted in this role's settings object
    #[must_use]
    #[inline]
    pub const fn sub_keys(&self) -> &'static [SubKey] {
        match *self {
            Self::AmqpBroker => AMQP_BROKER_KEYS,
            Self::Api => API_KEYS,
            Self::Content => CONTENT_KEYS,
            Self::Shell => SHELL_KEYS,
            Self::Mongod
            | Self::PulpCelerybeat
            | Self::PulpCli
            | Self::PulpResourceManager
            | Self::PulpWorkers
            | Self::Redis
            | Self::Squid => &[],
        }
    }

    /// Look up one of this role's sub-keys by name
    #[must_use]
    #[inline]
    pub fn sub_key(&self, name: &str) -> Option<&'static SubKey> {
        self.sub_keys().iter().find(|key| key.name == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised role name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}

/// Semantic type of a role sub-key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubKeyKind {
    /// One of a fixed set of string literals
    Enum(&'static [&'static str]),
    /// `true`/`false`, or a path to a CA bundle
    BooleanOrString,
    /// Any non-empty string
    String,
    /// TCP port number
    Port,
}

/// Value used when a sub-key is omitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubKeyDefault {
    /// Nothing is filled in; consumers treat absence specially
    None,
    Text(&'static str),
    Flag(bool),
    Port(u16),
    /// Depends on the version family of the application under test
    ByFamily {
        pulp2: &'static str,
        pulp3: &'static str,
    },
}

impl SubKeyDefault {
    /// Textual default for the given family, if any
    #[must_use]
    #[inline]
    pub const fn text(&self, family: VersionFamily) -> Option<&'static str> {
        match *self {
            Self::Text(text) => Some(text),
            Self::ByFamily { pulp2, pulp3 } => match family {
                VersionFamily::Pulp2 => Some(pulp2),
                VersionFamily::Pulp3 => Some(pulp3),
            },
            Self::None | Self::Flag(_) | Self::Port(_) => None,
        }
    }
}

/// Registry entry for one setting of a role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct SubKey {
    pub name: &'static str,
    pub kind: SubKeyKind,
    pub default: SubKeyDefault,
}

pub const SCHEMES: &[&str] = &["http", "https"];
pub const AMQP_SERVICES: &[&str] = &["qpidd", "rabbitmq"];
pub const API_SERVICES: &[&str] = &["httpd", "nginx"];
pub const SHELL_TRANSPORTS: &[&str] = &["local", "ssh"];

const AMQP_BROKER_KEYS: &[SubKey] = &[SubKey {
    name: "service",
    kind: SubKeyKind::Enum(AMQP_SERVICES),
    default: SubKeyDefault::Text("qpidd"),
}];

const API_KEYS: &[SubKey] = &[
    SubKey {
        name: "port",
        kind: SubKeyKind::Port,
        default: SubKeyDefault::None,
    },
    SubKey {
        name: "scheme",
        kind: SubKeyKind::Enum(SCHEMES),
        default: SubKeyDefault::Text("https"),
    },
    SubKey {
        name: "service",
        kind: SubKeyKind::Enum(API_SERVICES),
        default: SubKeyDefault::ByFamily {
            pulp2: "httpd",
            pulp3: "nginx",
        },
    },
    SubKey {
        name: "verify",
        kind: SubKeyKind::BooleanOrString,
        default: SubKeyDefault::Flag(true),
    },
];

const CONTENT_KEYS: &[SubKey] = &[
    SubKey {
        name: "port",
        kind: SubKeyKind::Port,
        default: SubKeyDefault::Port(24816),
    },
    SubKey {
        name: "scheme",
        kind: SubKeyKind::Enum(SCHEMES),
        default: SubKeyDefault::Text("https"),
    },
    SubKey {
        name: "service",
        kind: SubKeyKind::String,
        default: SubKeyDefault::Text("pulp_content_app"),
    },
    SubKey {
        name: "verify",
        kind: SubKeyKind::BooleanOrString,
        default: SubKeyDefault::Flag(true),
    },
];

const SHELL_KEYS: &[SubKey] = &[SubKey {
    name: "transport",
    kind: SubKeyKind::Enum(SHELL_TRANSPORTS),
    default: SubKeyDefault::None,
}];

/// Names of every role a settings file may declare
#[must_use]
#[inline]
pub fn recognized_role_names() -> BTreeSet<&'static str> {
    Role::ALL.iter().map(Role::as_str).collect()
}

/// Sub-keys accepted for `role`
#[must_use]
#[inline]
pub const fn sub_keys_for(role: Role) -> &'static [SubKey] {
    role.sub_keys()
}

/// Roles that must collectively be present for a version family
///
/// Shell access is needed regardless of version.
#[must_use]
#[inline]
pub fn required_roles(family: VersionFamily) -> BTreeSet<Role> {
    let mut roles = BTreeSet::from([Role::Shell]);
    match family {
        VersionFamily::Pulp2 => roles.extend([
            Role::AmqpBroker,
            Role::Api,
            Role::Mongod,
            Role::PulpCelerybeat,
            Role::PulpResourceManager,
            Role::PulpWorkers,
        ]),
        VersionFamily::Pulp3 => roles.extend([
            Role::Api,
            Role::PulpResourceManager,
            Role::PulpWorkers,
            Role::Redis,
        ]),
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            assert_eq!(
                serde_json::to_value(role).unwrap(),
                serde_json::Value::String(role.as_str().to_owned())
            );
        }
    }

    #[test]
    fn test_unknown_role() {
        assert_eq!(
            "webserver".parse::<Role>(),
            Err(UnknownRole("webserver".to_owned()))
        );
    }

    #[test]
    fn test_enum_defaults_are_allowed_values() {
        for role in Role::ALL {
            for key in role.sub_keys() {
                if let SubKeyKind::Enum(allowed) = key.kind {
                    for family in [VersionFamily::Pulp2, VersionFamily::Pulp3] {
                        if let Some(default) = key.default.text(family) {
                            assert!(allowed.contains(&default), "{role}.{}", key.name);
                        }
                    }
                }
            }
        }
    }
}
