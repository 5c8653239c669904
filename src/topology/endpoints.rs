//! Endpoint and service lookups derived from resolved role settings

use crate::config::registry::Role;
use crate::config::roles::RoleSettings;
use crate::config::Host;
use crate::error::ConfigError;
use crate::topology::Topology;
use std::collections::BTreeSet;

impl Role {
    /// Name of the system service backing this role, if it has one
    ///
    /// `settings` should already carry registry defaults so that roles with
    /// a configurable service report it.
    #[must_use]
    pub fn service(&self, settings: &RoleSettings) -> Option<String> {
        match *settings {
            RoleSettings::AmqpBroker(ref broker) => {
                broker.service.map(|service| service.as_str().to_owned())
            }
            RoleSettings::Api(ref api) => api.service.map(|service| service.as_str().to_owned()),
            RoleSettings::Content(ref content) => content.service.clone(),
            RoleSettings::PulpCelerybeat
            | RoleSettings::PulpResourceManager
            | RoleSettings::PulpWorkers => Some(self.as_str().replace(' ', "_")),
            RoleSettings::Mongod | RoleSettings::Redis | RoleSettings::Squid => {
                Some(self.as_str().to_owned())
            }
            RoleSettings::PulpCli | RoleSettings::Shell(_) => None,
        }
    }
}

impl Topology {
    /// Base URL of the API served by `host`, e.g. `https://pulp.example.com`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RoleNotFound`] if the host has no `api` role
    pub fn base_url(&self, host: &Host) -> Result<String, ConfigError> {
        let settings = self
            .settings_for(host, Role::Api)
            .ok_or(ConfigError::RoleNotFound { role: Role::Api })?;
        let api = settings
            .as_api()
            .ok_or(ConfigError::RoleNotFound { role: Role::Api })?;
        Ok(format_url(
            api.scheme.map_or("https", |scheme| scheme.as_str()),
            &host.hostname,
            api.port,
        ))
    }

    /// Base URL of the first API host
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RoleNotFound`] if no host has the `api` role
    #[inline]
    pub fn api_base_url(&self) -> Result<String, ConfigError> {
        let host = self.one_host_with_role(Role::Api)?;
        self.base_url(host)
    }

    /// Base URL content is served from
    ///
    /// Uses the first `content` host; without one, content is served by the
    /// API host on the API's scheme and port.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RoleNotFound`] if neither a `content` nor an
    /// `api` host exists
    pub fn content_base_url(&self) -> Result<String, ConfigError> {
        let Ok(host) = self.one_host_with_role(Role::Content) else {
            return self.api_base_url();
        };
        let settings = self
            .settings_for(host, Role::Content)
            .ok_or(ConfigError::RoleNotFound {
                role: Role::Content,
            })?;
        let content = settings.as_content().ok_or(ConfigError::RoleNotFound {
            role: Role::Content,
        })?;
        Ok(format_url(
            content.scheme.map_or("https", |scheme| scheme.as_str()),
            &host.hostname,
            content.port,
        ))
    }

    /// Services backing the roles declared by `host`
    #[must_use]
    pub fn services_for(&self, host: &Host) -> BTreeSet<String> {
        host.roles
            .roles()
            .filter_map(|role| {
                self.settings_for(host, role)
                    .and_then(|settings| role.service(&settings))
            })
            .collect()
    }
}

fn format_url(scheme: &str, hostname: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{scheme}://{hostname}:{port}"),
        None => format!("{scheme}://{hostname}"),
    }
}
