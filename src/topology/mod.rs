//! Topology resolution
//!
//! Turns validated [`Settings`] into an immutable index answering which hosts
//! play which role, after checking that hostnames are unique and that the
//! roles required by the Pulp version are all present.

pub mod endpoints;
pub mod transport;

use crate::config::registry::required_roles;
use crate::config::{Host, Role, RoleSettings, Settings};
use crate::error::ConfigError;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

pub use transport::{Transport, TransportCache, transport_for};

/// Resolved view of the hosts under test
#[derive(Debug)]
pub struct Topology {
    settings: Settings,
    /// Role -> indexes into `settings.hosts`, in document order
    by_role: BTreeMap<Role, Vec<usize>>,
    /// Hostname -> (index into `settings.hosts`, declared roles)
    by_host: HashMap<String, (usize, Vec<Role>)>,
    transports: TransportCache,
}

impl Topology {
    /// Resolve validated settings into a topology
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Two hosts share a hostname ([`ConfigError::DuplicateHost`])
    /// - Roles required by the Pulp version are absent
    ///   ([`ConfigError::MissingRoles`], naming every absent role)
    pub fn resolve(settings: Settings) -> Result<Self, ConfigError> {
        let mut by_role: BTreeMap<Role, Vec<usize>> = BTreeMap::new();
        let mut by_host = HashMap::with_capacity(settings.hosts.len());

        for (index, host) in settings.hosts.iter().enumerate() {
            if by_host.contains_key(&host.hostname) {
                return Err(ConfigError::DuplicateHost {
                    hostname: host.hostname.clone(),
                });
            }

            let roles: Vec<Role> = host.roles.roles().collect();
            for role in &roles {
                by_role.entry(*role).or_default().push(index);
            }
            by_host.insert(host.hostname.clone(), (index, roles));
        }

        let missing: Vec<Role> = required_roles(settings.family())
            .into_iter()
            .filter(|role| !by_role.contains_key(role))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingRoles { roles: missing });
        }

        debug!(
            "Resolved {} host(s) providing {} role(s) for Pulp {}",
            settings.hosts.len(),
            by_role.len(),
            settings.pulp.version
        );

        Ok(Self {
            settings,
            by_role,
            by_host,
            transports: TransportCache::new(),
        })
    }

    /// The settings this topology was resolved from
    #[must_use]
    #[inline]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// All hosts, in document order
    #[must_use]
    #[inline]
    pub fn hosts(&self) -> &[Host] {
        &self.settings.hosts
    }

    /// Look up a host by hostname
    #[must_use]
    #[inline]
    pub fn host(&self, hostname: &str) -> Option<&Host> {
        self.by_host
            .get(hostname)
            .and_then(|(index, _)| self.settings.hosts.get(*index))
    }

    /// Roles declared by a host
    #[must_use]
    #[inline]
    pub fn roles_of(&self, hostname: &str) -> Option<&[Role]> {
        self.by_host.get(hostname).map(|(_, roles)| roles.as_slice())
    }

    /// Hosts declaring `role`, in document order; empty when none do
    #[must_use]
    pub fn hosts_with_role(&self, role: Role) -> Vec<&Host> {
        self.by_role.get(&role).map_or_else(Vec::new, |indexes| {
            indexes
                .iter()
                .filter_map(|index| self.settings.hosts.get(*index))
                .collect()
        })
    }

    /// First host in document order declaring `role`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RoleNotFound`] if no host declares the role
    pub fn one_host_with_role(&self, role: Role) -> Result<&Host, ConfigError> {
        self.by_role
            .get(&role)
            .and_then(|indexes| indexes.first())
            .and_then(|index| self.settings.hosts.get(*index))
            .ok_or(ConfigError::RoleNotFound { role })
    }

    /// A host's settings for `role`, with registry defaults filled in
    ///
    /// Returns `None` when the host does not declare the role.
    #[must_use]
    pub fn settings_for(&self, host: &Host, role: Role) -> Option<RoleSettings> {
        host.roles
            .get(role)
            .cloned()
            .map(|settings| settings.with_defaults(self.settings.family()))
    }

    /// Transport for `host`, decided once per hostname for this topology
    #[must_use]
    #[inline]
    pub fn transport(&self, host: &Host, current_hostname: &str) -> Transport {
        self.transports.get_or_select(host, current_hostname)
    }

    /// API credentials, defaulting to `admin`/`admin`
    #[must_use]
    #[inline]
    pub fn credentials(&self) -> (&str, &str) {
        self.settings.pulp.credentials()
    }
}
