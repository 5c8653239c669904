//! Typed per-role settings
//!
//! Each role carries its own settings shape. [`RoleSettings`] has one variant
//! per role, picked by the role name while deserializing a host, so callers
//! never look settings up by string key.

use crate::config::registry::{Role, SubKeyDefault};
use crate::config::version::VersionFamily;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// URL scheme for HTTP endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    #[must_use]
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TLS certificate verification mode
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Verify {
    /// Verify against the system trust store, or not at all
    Flag(bool),
    /// Verify against the CA bundle at this path
    CaBundle(PathBuf),
}

/// Service backing the AMQP broker role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmqpService {
    Qpidd,
    Rabbitmq,
}

impl AmqpService {
    #[must_use]
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Qpidd => "qpidd",
            Self::Rabbitmq => "rabbitmq",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "qpidd" => Some(Self::Qpidd),
            "rabbitmq" => Some(Self::Rabbitmq),
            _ => None,
        }
    }
}

/// Web server in front of the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiService {
    Httpd,
    Nginx,
}

impl ApiService {
    #[must_use]
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Httpd => "httpd",
            Self::Nginx => "nginx",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "httpd" => Some(Self::Httpd),
            "nginx" => Some(Self::Nginx),
            _ => None,
        }
    }
}

/// Transport literal accepted in `shell` settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellTransport {
    Local,
    Ssh,
}

/// Settings of the `amqp broker` role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AmqpBrokerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<AmqpService>,
}

/// Settings of the `api` role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<Verify>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ApiService>,
}

/// Settings of the `content` role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify: Option<Verify>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Settings of the `shell` role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<ShellTransport>,
}

/// Roles without settings still reject stray keys
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoSettings {}

/// Settings attached to one role of one host
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoleSettings {
    AmqpBroker(AmqpBrokerSettings),
    Api(ApiSettings),
    Content(ContentSettings),
    Mongod,
    PulpCelerybeat,
    PulpCli,
    PulpResourceManager,
    PulpWorkers,
    Redis,
    Shell(ShellSettings),
    Squid,
}

impl RoleSettings {
    /// Deserialize `value` as the settings of `role`
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not fit the role's settings shape
    #[inline]
    pub fn from_value(role: Role, value: Value) -> Result<Self, serde_json::Error> {
        let settings = match role {
            Role::AmqpBroker => Self::AmqpBroker(serde_json::from_value(value)?),
            Role::Api => Self::Api(serde_json::from_value(value)?),
            Role::Content => Self::Content(serde_json::from_value(value)?),
            Role::Shell => Self::Shell(serde_json::from_value(value)?),
            Role::Mongod
            | Role::PulpCelerybeat
            | Role::PulpCli
            | Role::PulpResourceManager
            | Role::PulpWorkers
            | Role::Redis
            | Role::Squid => {
                serde_json::from_value::<NoSettings>(value)?;
                Self::empty(role)
            }
        };
        Ok(settings)
    }

    /// Settings for `role` with nothing filled in
    #[must_use]
    #[inline]
    pub fn empty(role: Role) -> Self {
        match role {
            Role::AmqpBroker => Self::AmqpBroker(AmqpBrokerSettings::default()),
            Role::Api => Self::Api(ApiSettings::default()),
            Role::Content => Self::Content(ContentSettings::default()),
            Role::Mongod => Self::Mongod,
            Role::PulpCelerybeat => Self::PulpCelerybeat,
            Role::PulpCli => Self::PulpCli,
            Role::PulpResourceManager => Self::PulpResourceManager,
            Role::PulpWorkers => Self::PulpWorkers,
            Role::Redis => Self::Redis,
            Role::Shell => Self::Shell(ShellSettings::default()),
            Role::Squid => Self::Squid,
        }
    }

    /// The role these settings belong to
    #[must_use]
    #[inline]
    pub const fn role(&self) -> Role {
        match *self {
            Self::AmqpBroker(_) => Role::AmqpBroker,
            Self::Api(_) => Role::Api,
            Self::Content(_) => Role::Content,
            Self::Mongod => Role::Mongod,
            Self::PulpCelerybeat => Role::PulpCelerybeat,
            Self::PulpCli => Role::PulpCli,
            Self::PulpResourceManager => Role::PulpResourceManager,
            Self::PulpWorkers => Role::PulpWorkers,
            Self::Redis => Role::Redis,
            Self::Shell(_) => Role::Shell,
            Self::Squid => Role::Squid,
        }
    }

    /// Fill omitted sub-keys from the registry defaults for `family`
    #[must_use]
    #[inline]
    pub fn with_defaults(self, family: VersionFamily) -> Self {
        match self {
            Self::AmqpBroker(mut settings) => {
                if settings.service.is_none() {
                    settings.service = default_text(Role::AmqpBroker, "service", family)
                        .and_then(AmqpService::from_name);
                }
                Self::AmqpBroker(settings)
            }
            Self::Api(mut settings) => {
                if settings.scheme.is_none() {
                    settings.scheme =
                        default_text(Role::Api, "scheme", family).and_then(Scheme::from_name);
                }
                if settings.port.is_none() {
                    settings.port = default_port(Role::Api, "port");
                }
                if settings.verify.is_none() {
                    settings.verify = default_flag(Role::Api, "verify").map(Verify::Flag);
                }
                if settings.service.is_none() {
                    settings.service =
                        default_text(Role::Api, "service", family).and_then(ApiService::from_name);
                }
                Self::Api(settings)
            }
            Self::Content(mut settings) => {
                if settings.scheme.is_none() {
                    settings.scheme =
                        default_text(Role::Content, "scheme", family).and_then(Scheme::from_name);
                }
                if settings.port.is_none() {
                    settings.port = default_port(Role::Content, "port");
                }
                if settings.verify.is_none() {
                    settings.verify = default_flag(Role::Content, "verify").map(Verify::Flag);
                }
                if settings.service.is_none() {
                    settings.service =
                        default_text(Role::Content, "service", family).map(str::to_owned);
                }
                Self::Content(settings)
            }
            other => other,
        }
    }

    #[must_use]
    #[inline]
    pub const fn as_api(&self) -> Option<&ApiSettings> {
        match *self {
            Self::Api(ref settings) => Some(settings),
            _ => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn as_content(&self) -> Option<&ContentSettings> {
        match *self {
            Self::Content(ref settings) => Some(settings),
            _ => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn as_shell(&self) -> Option<&ShellSettings> {
        match *self {
            Self::Shell(ref settings) => Some(settings),
            _ => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn as_amqp_broker(&self) -> Option<&AmqpBrokerSettings> {
        match *self {
            Self::AmqpBroker(ref settings) => Some(settings),
            _ => None,
        }
    }
}

fn default_text(role: Role, key: &str, family: VersionFamily) -> Option<&'static str> {
    role.sub_key(key).and_then(|sub_key| sub_key.default.text(family))
}

fn default_flag(role: Role, key: &str) -> Option<bool> {
    match role.sub_key(key)?.default {
        SubKeyDefault::Flag(flag) => Some(flag),
        _ => None,
    }
}

fn default_port(role: Role, key: &str) -> Option<u16> {
    match role.sub_key(key)?.default {
        SubKeyDefault::Port(port) => Some(port),
        _ => None,
    }
}

impl Serialize for RoleSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::AmqpBroker(ref settings) => settings.serialize(serializer),
            Self::Api(ref settings) => settings.serialize(serializer),
            Self::Content(ref settings) => settings.serialize(serializer),
            Self::Shell(ref settings) => settings.serialize(serializer),
            Self::Mongod
            | Self::PulpCelerybeat
            | Self::PulpCli
            | Self::PulpResourceManager
            | Self::PulpWorkers
            | Self::Redis
            | Self::Squid => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Roles declared by a host, keyed by role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roles(BTreeMap<Role, RoleSettings>);

impl Roles {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the settings for a role (builder pattern)
    #[must_use]
    #[inline]
    pub fn with(mut self, settings: RoleSettings) -> Self {
        self.0.insert(settings.role(), settings);
        self
    }

    #[must_use]
    #[inline]
    pub fn get(&self, role: Role) -> Option<&RoleSettings> {
        self.0.get(&role)
    }

    #[must_use]
    #[inline]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains_key(&role)
    }

    /// Declared roles in registry order
    #[inline]
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.keys().copied()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Role, &RoleSettings)> + '_ {
        self.0.iter().map(|(role, settings)| (*role, settings))
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<RoleSettings> for Roles {
    fn from_iter<I: IntoIterator<Item = RoleSettings>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|settings| (settings.role(), settings))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for Roles {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<Role, Value>::deserialize(deserializer)?;
        let mut roles = BTreeMap::new();
        for (role, value) in raw {
            let settings = RoleSettings::from_value(role, value)
                .map_err(|e| de::Error::custom(format!("role '{role}': {e}")))?;
            roles.insert(role, settings);
        }
        Ok(Self(roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variant_follows_role_name() {
        let roles: Roles = serde_json::from_value(json!({
            "api": {"scheme": "http", "port": 24817},
            "shell": {"transport": "ssh"},
            "redis": {}
        }))
        .unwrap();

        assert_eq!(roles.len(), 3);
        let api = roles.get(Role::Api).and_then(RoleSettings::as_api).unwrap();
        assert_eq!(api.scheme, Some(Scheme::Http));
        assert_eq!(api.port, Some(24817));
        assert_eq!(roles.get(Role::Redis), Some(&RoleSettings::Redis));
        assert_eq!(
            roles.get(Role::Shell).and_then(RoleSettings::as_shell).unwrap().transport,
            Some(ShellTransport::Ssh)
        );
    }

    #[test]
    fn test_unknown_sub_key_rejected() {
        let result = serde_json::from_value::<Roles>(json!({"mongod": {"port": 27017}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_accepts_bool_or_path() {
        let api: ApiSettings = serde_json::from_value(json!({"verify": false})).unwrap();
        assert_eq!(api.verify, Some(Verify::Flag(false)));

        let api: ApiSettings =
            serde_json::from_value(json!({"verify": "/etc/pki/ca.pem"})).unwrap();
        assert_eq!(api.verify, Some(Verify::CaBundle(PathBuf::from("/etc/pki/ca.pem"))));
    }

    #[test]
    fn test_api_defaults_depend_on_family() {
        let pulp2 = RoleSettings::empty(Role::Api).with_defaults(VersionFamily::Pulp2);
        let pulp3 = RoleSettings::empty(Role::Api).with_defaults(VersionFamily::Pulp3);

        let pulp2 = pulp2.as_api().unwrap();
        assert_eq!(pulp2.scheme, Some(Scheme::Https));
        assert_eq!(pulp2.verify, Some(Verify::Flag(true)));
        assert_eq!(pulp2.service, Some(ApiService::Httpd));
        assert_eq!(pulp2.port, None);
        assert_eq!(pulp3.as_api().unwrap().service, Some(ApiService::Nginx));
    }

    #[test]
    fn test_explicit_values_survive_defaults() {
        let settings = RoleSettings::Content(ContentSettings {
            scheme: Some(Scheme::Http),
            port: Some(8080),
            ..ContentSettings::default()
        })
        .with_defaults(VersionFamily::Pulp3);

        let content = settings.as_content().unwrap();
        assert_eq!(content.scheme, Some(Scheme::Http));
        assert_eq!(content.port, Some(8080));
        assert_eq!(content.service.as_deref(), Some("pulp_content_app"));
    }

    #[test]
    fn test_shell_transport_has_no_default() {
        let shell = RoleSettings::empty(Role::Shell).with_defaults(VersionFamily::Pulp3);
        assert_eq!(shell.as_shell().unwrap().transport, None);
    }

    #[test]
    fn test_bare_role_serializes_as_empty_object() {
        let roles = Roles::new().with(RoleSettings::PulpWorkers);
        assert_eq!(
            serde_json::to_value(&roles).unwrap(),
            json!({"pulp workers": {}})
        );
    }
}
