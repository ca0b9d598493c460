//! Structural matching and normalization.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{Contract, Field, Presence};

impl Contract {
    /// Returns the normalized form of `value` when it satisfies the contract.
    ///
    /// Normalization drops object keys the contract does not declare and
    /// inserts declared defaults for absent fields. `None` means the value
    /// does not match.
    #[must_use]
    pub fn conform(&self, value: &Value) -> Option<Value> {
        match self {
            Self::Any => Some(value.clone()),
            Self::Null => value.is_null().then_some(Value::Null),
            Self::Boolean => value.is_boolean().then(|| value.clone()),
            Self::Number => value.is_number().then(|| value.clone()),
            Self::Integer => (value.is_i64() || value.is_u64()).then(|| value.clone()),
            Self::String => value.is_string().then(|| value.clone()),
            Self::Literal(expected) => (value == expected).then(|| value.clone()),
            Self::Array(item) => conform_array(item.as_deref(), value),
            Self::Object(fields) => conform_object(fields, value),
            Self::Map(item) => conform_map(item, value),
            Self::OneOf(alternatives) => alternatives.iter().find_map(|c| c.conform(value)),
        }
    }

    /// Returns `true` when `value` satisfies the contract.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        self.conform(value).is_some()
    }
}

fn conform_array(item: Option<&Contract>, value: &Value) -> Option<Value> {
    let elements = value.as_array()?;
    let Some(contract) = item else {
        return Some(value.clone());
    };
    elements
        .iter()
        .map(|element| contract.conform(element))
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

fn conform_object(fields: &[Field], value: &Value) -> Option<Value> {
    let entries = value.as_object()?;
    let mut normalized = Map::new();
    for field in fields {
        match (entries.get(field.name()), field.presence()) {
            (Some(present), _) => {
                normalized.insert(field.name().to_owned(), field.contract().conform(present)?);
            }
            (None, Presence::Required) => return None,
            (None, Presence::Optional) => {}
            (None, Presence::Default(default)) => {
                normalized.insert(field.name().to_owned(), default.clone());
            }
        }
    }
    Some(Value::Object(normalized))
}

fn conform_map(item: &Contract, value: &Value) -> Option<Value> {
    value
        .as_object()?
        .iter()
        .map(|(key, entry)| item.conform(entry).map(|normalized| (key.clone(), normalized)))
        .collect::<Option<Map<_, _>>>()
        .map(Value::Object)
}

/// The contract a value was matched against, with the normalized value.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Position of the first matching contract in the declared list.
    pub index: usize,
    /// The value after normalization by that contract.
    pub value: Value,
}

/// Selects the first contract in `contracts` that `value` satisfies.
///
/// Contracts are tried in declaration order, so more specific shapes should be
/// declared before more permissive ones. An empty list never matches; callers
/// treat an empty list as "no constraint" before calling this.
#[must_use]
pub fn select(value: &Value, contracts: &[Contract]) -> Option<Selection> {
    contracts.iter().enumerate().find_map(|(index, contract)| {
        contract
            .conform(value)
            .map(|normalized| Selection {
                index,
                value: normalized,
            })
    })
}

/// A result payload that violates a command's declared output shapes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputViolation {
    /// No output contracts were declared and the payload is neither absent
    /// nor a string.
    #[error("no output contracts declared, so only an absent body or a string is allowed; found {found}")]
    Undeclared {
        /// JSON kind of the offending payload.
        found: &'static str,
    },
    /// The payload is absent or matched none of the declared contracts.
    #[error("{found} payload matched none of {declared} output contracts")]
    Unmatched {
        /// Number of output contracts the command declared.
        declared: usize,
        /// JSON kind of the offending payload (`"absent"` when there was
        /// none).
        found: &'static str,
    },
}

impl OutputViolation {
    /// Number of output contracts the command declared.
    #[must_use]
    pub const fn declared(&self) -> usize {
        match self {
            Self::Undeclared { .. } => 0,
            Self::Unmatched { declared, .. } => *declared,
        }
    }

    /// JSON kind of the offending payload (`"absent"` when there was none).
    #[must_use]
    pub const fn found(&self) -> &'static str {
        match self {
            Self::Undeclared { found } | Self::Unmatched { found, .. } => *found,
        }
    }
}

/// Validates and normalizes a result payload against output contracts.
///
/// With no declared contracts only an absent body or a plain string is
/// acceptable. Otherwise the payload must be present and match one of the
/// contracts, and it is returned in that contract's normalized form.
///
/// # Errors
///
/// Returns [`OutputViolation`] when the payload is not acceptable.
pub fn conform_output(
    body: Option<&Value>,
    contracts: &[Contract],
) -> Result<Option<Value>, OutputViolation> {
    let found = body.map_or("absent", kind);

    if contracts.is_empty() {
        return match body {
            None => Ok(None),
            Some(text @ Value::String(_)) => Ok(Some(text.clone())),
            Some(_) => Err(OutputViolation::Undeclared { found }),
        };
    }

    let unmatched = || OutputViolation::Unmatched {
        declared: contracts.len(),
        found,
    };
    let payload = body.ok_or_else(unmatched)?;
    select(payload, contracts)
        .map(|selection| Some(selection.value))
        .ok_or_else(unmatched)
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
