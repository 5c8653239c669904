//! Settings document validation
//!
//! Validation runs in two steps: the raw document is checked against the
//! generated JSON schema, collecting every violation, and only then is it
//! deserialized into [`Settings`].

use crate::config::registry::{Role, SubKeyKind};
use crate::config::schema::get_schema;
use crate::config::{PulpVersion, Settings};
use crate::error::{ConfigError, SchemaError, SchemaViolation, ViolationKind};
use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use tracing::debug;

/// Validate a raw settings document
///
/// # Errors
///
/// Returns [`ConfigError::Schema`] carrying every violation found, each with
/// the path to the offending field
#[inline]
pub fn validate(document: &Value) -> Result<Settings, ConfigError> {
    let schema = get_schema()?;

    let mut violations = Vec::new();
    for error in schema.iter_errors(document) {
        let path = pointer_to_path(&error.instance_path.to_string());
        match error.kind {
            ValidationErrorKind::Required { ref property } => {
                let key = property.as_str().unwrap_or_default();
                violations.push(SchemaViolation::new(
                    child_path(&path, key),
                    ViolationKind::Missing,
                    format!("'{key}' is required"),
                ));
            }
            ValidationErrorKind::AdditionalProperties { ref unexpected } => {
                for key in unexpected {
                    violations.push(SchemaViolation::new(
                        child_path(&path, key),
                        ViolationKind::UnknownKey,
                        format!("'{key}' is not a recognised key here"),
                    ));
                }
            }
            ValidationErrorKind::Type { .. } => {
                violations.push(SchemaViolation::new(
                    path,
                    ViolationKind::WrongType,
                    lower_first(&error.to_string()),
                ));
            }
            ValidationErrorKind::Enum { .. } => {
                violations.push(SchemaViolation::new(
                    path,
                    ViolationKind::InvalidEnumValue,
                    lower_first(&error.to_string()),
                ));
            }
            _ => {
                violations.push(SchemaViolation::new(
                    path,
                    ViolationKind::InvalidValue,
                    lower_first(&error.to_string()),
                ));
            }
        }
    }

    if violations.is_empty() {
        violations = typed_violations(document);
    }

    if !violations.is_empty() {
        debug!("Settings rejected with {} violation(s)", violations.len());
        return Err(SchemaError::new(violations).into());
    }

    serde_json::from_value(document.clone()).map_err(|e| {
        SchemaError::new(vec![SchemaViolation::new(
            "",
            ViolationKind::WrongType,
            e.to_string(),
        )])
        .into()
    })
}

/// Re-validate typed settings by writing them out and checking the result
///
/// # Errors
///
/// Returns [`ConfigError::Schema`] if the serialized settings are rejected
#[inline]
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let document = serde_json::to_value(settings).map_err(|e| {
        SchemaError::new(vec![SchemaViolation::new(
            "",
            ViolationKind::InvalidValue,
            e.to_string(),
        )])
    })?;
    validate(&document).map(|_| ())
}

/// Checks the schema cannot express: integers written with a fraction part
/// (`443.0`) and version components too large to represent
fn typed_violations(document: &Value) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();

    if let Some(version) = document.pointer("/pulp/version").and_then(Value::as_str)
        && let Err(e) = version.parse::<PulpVersion>()
    {
        violations.push(SchemaViolation::new(
            "pulp.version",
            ViolationKind::InvalidValue,
            e.to_string(),
        ));
    }

    if let Some(timeout) = document.pointer("/general/timeout") {
        check_whole_number(timeout, "general.timeout", &mut violations);
    }

    let hosts = document
        .get("hosts")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice);
    for (index, host) in hosts.iter().enumerate() {
        let Some(roles) = host.get("roles").and_then(Value::as_object) else {
            continue;
        };
        for (name, settings) in roles {
            let Ok(role) = name.parse::<Role>() else {
                continue;
            };
            for key in role.sub_keys() {
                if key.kind == SubKeyKind::Port
                    && let Some(value) = settings.get(key.name)
                {
                    let path = pointer_to_path(&format!(
                        "/hosts/{index}/roles/{name}/{}",
                        key.name
                    ));
                    check_whole_number(value, &path, &mut violations);
                }
            }
        }
    }

    violations
}

fn check_whole_number(value: &Value, path: &str, violations: &mut Vec<SchemaViolation>) {
    if !value.is_u64() {
        violations.push(SchemaViolation::new(
            path,
            ViolationKind::WrongType,
            format!("{value} is not written as a whole number"),
        ));
    }
}

/// Render a JSON pointer such as `/hosts/0/roles/amqp broker` as
/// `hosts[0].roles["amqp broker"]`
#[must_use]
pub fn pointer_to_path(pointer: &str) -> String {
    let mut path = String::new();
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        path = child_path(&path, &segment);
    }
    path
}

fn child_path(parent: &str, key: &str) -> String {
    if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
        format!("{parent}[{key}]")
    } else if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        format!("{parent}[{key:?}]")
    } else if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

fn lower_first(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}
