//! Transport selection
//!
//! Decides whether commands for a host run through a local process or a
//! remote shell. Explicit `shell.transport` settings win; otherwise the host
//! is local only when its hostname equals the current machine's hostname.

use crate::config::roles::ShellTransport;
use crate::config::{Host, Role};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use tracing::{debug, warn};

/// How commands reach a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Transport {
    /// Run as a child process of this machine
    Local,
    /// Run through a remote shell (SSH)
    Remote,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("ssh"),
        }
    }
}

impl From<ShellTransport> for Transport {
    fn from(transport: ShellTransport) -> Self {
        match transport {
            ShellTransport::Local => Self::Local,
            ShellTransport::Ssh => Self::Remote,
        }
    }
}

/// Transport explicitly configured for a host, if any
#[must_use]
#[inline]
pub fn configured_transport(host: &Host) -> Option<Transport> {
    host.roles
        .get(Role::Shell)
        .and_then(|settings| settings.as_shell())
        .and_then(|shell| shell.transport)
        .map(Transport::from)
}

/// Pick the transport for `host` when running on `current_hostname`
#[must_use]
#[inline]
pub fn transport_for(host: &Host, current_hostname: &str) -> Transport {
    configured_transport(host).unwrap_or(if host.hostname == current_hostname {
        Transport::Local
    } else {
        Transport::Remote
    })
}

/// Per-host memo of transport decisions
///
/// The first decision made for a hostname is kept for the cache's lifetime,
/// even if later calls pass a different current hostname.
#[derive(Debug, Default)]
pub struct TransportCache {
    decisions: RwLock<HashMap<String, Transport>>,
}

impl TransportCache {
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached decision for `host`, computing it on first use
    pub fn get_or_select(&self, host: &Host, current_hostname: &str) -> Transport {
        match self.decisions.read() {
            Ok(decisions) => {
                if let Some(transport) = decisions.get(&host.hostname) {
                    return *transport;
                }
            }
            Err(e) => warn!("Transport cache unavailable: {e}"),
        }

        let selected = transport_for(host, current_hostname);
        match self.decisions.write() {
            Ok(mut decisions) => {
                // Another thread may have decided first; keep its answer
                let transport = *decisions.entry(host.hostname.clone()).or_insert(selected);
                debug!("Transport for {}: {}", host.hostname, transport);
                transport
            }
            Err(e) => {
                warn!("Transport cache unavailable: {e}");
                selected
            }
        }
    }

    /// Decision already made for `hostname`, if any
    #[must_use]
    pub fn cached(&self, hostname: &str) -> Option<Transport> {
        self.decisions
            .read()
            .ok()
            .and_then(|decisions| decisions.get(hostname).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::roles::{RoleSettings, Roles, ShellSettings};

    fn host(hostname: &str, transport: Option<ShellTransport>) -> Host {
        Host::new(
            hostname,
            Roles::new().with(RoleSettings::Shell(ShellSettings { transport })),
        )
    }

    #[test]
    fn test_equal_hostname_is_local() {
        let host = host("pulp.example.com", None);
        assert_eq!(transport_for(&host, "pulp.example.com"), Transport::Local);
    }

    #[test]
    fn test_different_hostname_is_remote() {
        let host = host("pulp.example.com", None);
        assert_eq!(transport_for(&host, "runner.example.com"), Transport::Remote);
    }

    #[test]
    fn test_explicit_ssh_beats_equal_hostname() {
        let host = host("a.example.com", Some(ShellTransport::Ssh));
        assert_eq!(transport_for(&host, "a.example.com"), Transport::Remote);
    }

    #[test]
    fn test_explicit_local_beats_different_hostname() {
        let host = host("pulp", Some(ShellTransport::Local));
        assert_eq!(transport_for(&host, "container-1234"), Transport::Local);
    }

    #[test]
    fn test_host_without_shell_role_uses_hostname() {
        let host = Host::new("db.example.com", Roles::new().with(RoleSettings::Mongod));
        assert_eq!(transport_for(&host, "db.example.com"), Transport::Local);
    }

    #[test]
    fn test_cache_keeps_first_decision() {
        let cache = TransportCache::new();
        let host = host("pulp.example.com", None);

        assert_eq!(cache.cached("pulp.example.com"), None);
        assert_eq!(
            cache.get_or_select(&host, "pulp.example.com"),
            Transport::Local
        );
        // The current hostname changed, but the decision must not
        assert_eq!(cache.get_or_select(&host, "elsewhere"), Transport::Local);
        assert_eq!(cache.cached("pulp.example.com"), Some(Transport::Local));
    }
}
