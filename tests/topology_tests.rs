//! Topology resolution and endpoint lookup tests

use serde_json::{Value, json};
use smash_config::config::Role;
use smash_config::config::Settings;
use smash_config::config::roles::{AmqpService, ApiService, Scheme, Verify};
use smash_config::error::ConfigError;
use smash_config::topology::Topology;

fn resolve(document: &Value) -> Result<Topology, ConfigError> {
    Topology::resolve(Settings::from_value(document).unwrap())
}

fn pulp3_single_host() -> Value {
    json!({
        "pulp": {"version": "3.0"},
        "hosts": [{
            "hostname": "pulp3.example.com",
            "roles": {
                "api": {"scheme": "https"},
                "pulp resource manager": {},
                "pulp workers": {},
                "redis": {},
                "shell": {}
            }
        }]
    })
}

fn pulp2_two_hosts() -> Value {
    json!({
        "pulp": {"version": "2.12.2"},
        "hosts": [
            {
                "hostname": "first.example.com",
                "roles": {
                    "amqp broker": {"service": "rabbitmq"},
                    "api": {"scheme": "http", "port": 8080},
                    "mongod": {},
                    "pulp celerybeat": {},
                    "pulp resource manager": {},
                    "pulp workers": {},
                    "shell": {"transport": "ssh"}
                }
            },
            {
                "hostname": "second.example.com",
                "roles": {
                    "pulp workers": {},
                    "shell": {},
                    "squid": {}
                }
            }
        ]
    })
}

#[test]
fn test_resolve_complete_pulp3_topology() {
    let topology = resolve(&pulp3_single_host()).unwrap();

    assert_eq!(topology.hosts().len(), 1);
    let host = topology.host("pulp3.example.com").unwrap();
    assert!(host.has_role(Role::Redis));
    assert!(topology.host("missing.example.com").is_none());
    assert_eq!(
        topology.roles_of("pulp3.example.com").unwrap(),
        &[
            Role::Api,
            Role::PulpResourceManager,
            Role::PulpWorkers,
            Role::Redis,
            Role::Shell
        ]
    );
}

#[test]
fn test_missing_pulp3_roles_are_all_named() {
    let err = resolve(&json!({
        "pulp": {"version": "3"},
        "hosts": [{"hostname": "a.example.com", "roles": {"api": {}, "shell": {}}}]
    }))
    .unwrap_err();

    match err {
        ConfigError::MissingRoles { ref roles } => assert_eq!(
            roles,
            &[Role::PulpResourceManager, Role::PulpWorkers, Role::Redis]
        ),
        ref other => panic!("expected missing roles, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 4);
    assert_eq!(
        err.to_string(),
        "the following roles are missing: pulp resource manager, pulp workers, redis"
    );
}

#[test]
fn test_pulp2_requires_its_own_roles() {
    // A complete Pulp 3 host is incomplete for Pulp 2
    let mut document = pulp3_single_host();
    document["pulp"]["version"] = json!("2.12");

    let err = resolve(&document).unwrap_err();
    match err {
        ConfigError::MissingRoles { ref roles } => assert_eq!(
            roles,
            &[Role::AmqpBroker, Role::Mongod, Role::PulpCelerybeat]
        ),
        ref other => panic!("expected missing roles, got {other:?}"),
    }
}

#[test]
fn test_empty_hosts_fail_resolution() {
    let err = resolve(&json!({"pulp": {"version": "3"}, "hosts": []})).unwrap_err();
    assert!(matches!(err, ConfigError::MissingRoles { ref roles } if roles.contains(&Role::Shell)));
}

#[test]
fn test_duplicate_hostname() {
    let err = resolve(&json!({
        "pulp": {"version": "3"},
        "hosts": [
            {"hostname": "dup.example.com", "roles": {"shell": {}}},
            {"hostname": "dup.example.com", "roles": {"api": {}}}
        ]
    }))
    .unwrap_err();

    assert!(
        matches!(err, ConfigError::DuplicateHost { ref hostname } if hostname == "dup.example.com")
    );
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_hosts_with_role_keeps_document_order() {
    let topology = resolve(&pulp2_two_hosts()).unwrap();

    let shells: Vec<&str> = topology
        .hosts_with_role(Role::Shell)
        .iter()
        .map(|host| host.hostname.as_str())
        .collect();
    assert_eq!(shells, ["first.example.com", "second.example.com"]);

    let workers = topology.hosts_with_role(Role::PulpWorkers);
    assert_eq!(workers.len(), 2);

    assert!(topology.hosts_with_role(Role::Redis).is_empty());
}

#[test]
fn test_one_host_with_role() {
    let topology = resolve(&pulp2_two_hosts()).unwrap();

    let host = topology.one_host_with_role(Role::Shell).unwrap();
    assert_eq!(host.hostname, "first.example.com");

    let squid = topology.one_host_with_role(Role::Squid).unwrap();
    assert_eq!(squid.hostname, "second.example.com");

    let err = topology.one_host_with_role(Role::PulpCli).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::RoleNotFound {
            role: Role::PulpCli
        }
    ));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn test_settings_for_fills_defaults() {
    let topology = resolve(&pulp3_single_host()).unwrap();
    let host = topology.one_host_with_role(Role::Api).unwrap();

    let settings = topology.settings_for(host, Role::Api).unwrap();
    let api = settings.as_api().unwrap();
    assert_eq!(api.scheme, Some(Scheme::Https));
    assert_eq!(api.port, None);
    assert_eq!(api.verify, Some(Verify::Flag(true)));
    assert_eq!(api.service, Some(ApiService::Nginx));

    assert!(topology.settings_for(host, Role::Squid).is_none());
}

#[test]
fn test_settings_for_keeps_explicit_values() {
    let topology = resolve(&pulp2_two_hosts()).unwrap();
    let host = topology.host("first.example.com").unwrap();

    let api = topology.settings_for(host, Role::Api).unwrap();
    let api = api.as_api().unwrap();
    assert_eq!(api.scheme, Some(Scheme::Http));
    assert_eq!(api.port, Some(8080));
    assert_eq!(api.service, Some(ApiService::Httpd));

    let broker = topology.settings_for(host, Role::AmqpBroker).unwrap();
    assert_eq!(
        broker.as_amqp_broker().unwrap().service,
        Some(AmqpService::Rabbitmq)
    );
}

#[test]
fn test_credentials_default() {
    let topology = resolve(&pulp3_single_host()).unwrap();
    assert_eq!(topology.credentials(), ("admin", "admin"));
}

#[test]
fn test_base_urls() {
    let topology = resolve(&pulp2_two_hosts()).unwrap();
    assert_eq!(
        topology.api_base_url().unwrap(),
        "http://first.example.com:8080"
    );
    // No content host: content is served by the API host
    assert_eq!(
        topology.content_base_url().unwrap(),
        "http://first.example.com:8080"
    );

    let second = topology.host("second.example.com").unwrap();
    assert!(matches!(
        topology.base_url(second),
        Err(ConfigError::RoleNotFound { role: Role::Api })
    ));
}

#[test]
fn test_content_base_url_uses_content_host() {
    let mut document = pulp3_single_host();
    document["hosts"]
        .as_array_mut()
        .unwrap()
        .push(json!({"hostname": "content.example.com", "roles": {"content": {}}}));

    let topology = resolve(&document).unwrap();
    assert_eq!(
        topology.api_base_url().unwrap(),
        "https://pulp3.example.com"
    );
    assert_eq!(
        topology.content_base_url().unwrap(),
        "https://content.example.com:24816"
    );
}

#[test]
fn test_services_for_host() {
    let topology = resolve(&pulp2_two_hosts()).unwrap();

    let first = topology.host("first.example.com").unwrap();
    let services: Vec<String> = topology.services_for(first).into_iter().collect();
    assert_eq!(
        services,
        [
            "httpd",
            "mongod",
            "pulp_celerybeat",
            "pulp_resource_manager",
            "pulp_workers",
            "rabbitmq"
        ]
    );

    let second = topology.host("second.example.com").unwrap();
    let services: Vec<String> = topology.services_for(second).into_iter().collect();
    assert_eq!(services, ["pulp_workers", "squid"]);
}
