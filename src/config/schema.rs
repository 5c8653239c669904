//! JSON Schema for the settings document
//!
//! The schema is generated from the role registry so the set of accepted
//! roles and sub-keys cannot drift from what the resolver knows about.

use crate::config::MAX_TASK_TIMEOUT;
use crate::config::registry::{Role, SubKeyKind};
use crate::config::version::VERSION_PATTERN;
use crate::error::ConfigError;
use jsonschema::{Draft, Validator};
use serde_json::{Map, Value, json};

/// Build the settings schema as a JSON value
#[must_use]
pub fn settings_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Pulp Smash settings",
        "type": "object",
        "additionalProperties": false,
        "required": ["pulp", "hosts"],
        "properties": {
            "pulp": {
                "type": "object",
                "additionalProperties": false,
                "required": ["version"],
                "properties": {
                    "version": {
                        "type": "string",
                        "minLength": 1,
                        "pattern": VERSION_PATTERN,
                    },
                    "auth": {
                        "type": "array",
                        "minItems": 2,
                        "maxItems": 2,
                        "items": {"type": "string"},
                    },
                    "selinux enabled": {"type": "boolean"},
                },
            },
            "general": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "timeout": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_TASK_TIMEOUT,
                    },
                },
            },
            "hosts": {
                "type": "array",
                "items": {"$ref": "#/definitions/host"},
            },
        },
        "definitions": {
            "host": {
                "type": "object",
                "additionalProperties": false,
                "required": ["hostname"],
                "properties": {
                    "hostname": {"type": "string", "minLength": 1},
                    "roles": roles_schema(),
                },
            },
        },
    })
}

fn roles_schema() -> Value {
    let properties: Map<String, Value> = Role::ALL
        .iter()
        .map(|role| (role.as_str().to_owned(), role_schema(*role)))
        .collect();

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
    })
}

fn role_schema(role: Role) -> Value {
    let properties: Map<String, Value> = role
        .sub_keys()
        .iter()
        .map(|key| (key.name.to_owned(), sub_key_schema(key.kind)))
        .collect();

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": properties,
    })
}

fn sub_key_schema(kind: SubKeyKind) -> Value {
    match kind {
        // `enum` alone already rejects non-strings
        SubKeyKind::Enum(allowed) => json!({"enum": allowed}),
        SubKeyKind::BooleanOrString => json!({"type": ["boolean", "string"], "minLength": 1}),
        SubKeyKind::String => json!({"type": "string", "minLength": 1}),
        SubKeyKind::Port => json!({"type": "integer", "minimum": 0, "maximum": 65535}),
    }
}

/// Compile the settings schema
///
/// # Errors
///
/// Returns [`ConfigError::InvalidSchema`] if the generated schema does not
/// compile
pub fn get_schema() -> Result<Validator, ConfigError> {
    jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(&settings_schema())
        .map_err(|e| ConfigError::InvalidSchema {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_compiles() {
        assert!(get_schema().is_ok());
    }

    #[test]
    fn test_every_role_has_a_schema() {
        let schema = settings_schema();
        let roles = &schema["definitions"]["host"]["properties"]["roles"]["properties"];
        for role in Role::ALL {
            assert!(roles.get(role.as_str()).is_some(), "{role}");
        }
    }

    #[test]
    fn test_sub_keys_are_listed() {
        let schema = settings_schema();
        let api = &schema["definitions"]["host"]["properties"]["roles"]["properties"]["api"];
        assert_eq!(api["properties"]["scheme"]["enum"], json!(["http", "https"]));
        assert_eq!(api["properties"]["verify"]["type"], json!(["boolean", "string"]));
        assert_eq!(api["properties"]["verify"]["minLength"], json!(1));
    }
}
