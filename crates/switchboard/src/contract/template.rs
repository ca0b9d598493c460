//! JSON template grammar for contracts.
//!
//! Strings name primitive types, arrays wrap an item contract, objects
//! declare fields (a trailing `?` marks an optional field), and keys starting
//! with `$` are directives. Booleans and numbers stand for themselves.

use serde_json::{Map, Value};

use super::{Contract, ContractError, Field, Presence};

const OPTIONAL_MARKER: char = '?';
const LITERAL: &str = "$literal";
const ONE_OF: &str = "$oneOf";
const MAP: &str = "$map";
const TYPE: &str = "$type";
const DEFAULT: &str = "$default";

pub(super) fn parse(template: &Value) -> Result<Contract, ContractError> {
    match template {
        Value::Null => Ok(Contract::Null),
        Value::Bool(_) | Value::Number(_) => Ok(Contract::Literal(template.clone())),
        Value::String(name) => parse_type_name(name),
        Value::Array(items) => parse_array(items),
        Value::Object(entries) => parse_object(entries),
    }
}

fn parse_type_name(name: &str) -> Result<Contract, ContractError> {
    match name {
        "any" => Ok(Contract::Any),
        "null" => Ok(Contract::Null),
        "boolean" => Ok(Contract::Boolean),
        "number" => Ok(Contract::Number),
        "integer" => Ok(Contract::Integer),
        "string" => Ok(Contract::String),
        other => Err(ContractError::UnknownType {
            name: other.to_owned(),
        }),
    }
}

fn parse_array(items: &[Value]) -> Result<Contract, ContractError> {
    match items {
        [] => Ok(Contract::Array(None)),
        [item] => Ok(Contract::array_of(parse(item)?)),
        _ => Err(ContractError::AmbiguousArray { count: items.len() }),
    }
}

fn parse_object(entries: &Map<String, Value>) -> Result<Contract, ContractError> {
    if let Some(directive) = entries.keys().find(|key| key.starts_with('$')) {
        return parse_directive(directive, entries);
    }
    entries
        .iter()
        .map(|(key, value)| parse_field(key, value))
        .collect::<Result<Vec<_>, _>>()
        .map(Contract::Object)
}

fn parse_directive(directive: &str, entries: &Map<String, Value>) -> Result<Contract, ContractError> {
    match directive {
        LITERAL => {
            let value = sole_entry(directive, entries)?;
            Ok(Contract::Literal(value.clone()))
        }
        ONE_OF => {
            let Value::Array(alternatives) = sole_entry(directive, entries)? else {
                return Err(malformed(directive, "an array of contracts"));
            };
            if alternatives.is_empty() {
                return Err(malformed(directive, "at least one alternative"));
            }
            alternatives
                .iter()
                .map(parse)
                .collect::<Result<Vec<_>, _>>()
                .map(Contract::OneOf)
        }
        MAP => {
            let value = sole_entry(directive, entries)?;
            Ok(Contract::map_of(parse(value)?))
        }
        TYPE | DEFAULT => {
            if entries.contains_key(DEFAULT) {
                return Err(ContractError::DefaultOutsideField);
            }
            let value = sole_entry(TYPE, entries)?;
            parse(value)
        }
        other => Err(ContractError::UnknownDirective {
            directive: other.to_owned(),
        }),
    }
}

fn parse_field(key: &str, value: &Value) -> Result<Field, ContractError> {
    let (name, optional) = key
        .strip_suffix(OPTIONAL_MARKER)
        .map_or((key, false), |stripped| (stripped, true));
    if name.is_empty() {
        return Err(ContractError::EmptyFieldName);
    }

    if let Some((contract, default)) = defaulted_field(value)? {
        return Field::with_default(name, contract, default);
    }

    let contract = parse(value)?;
    Ok(if optional {
        Field::optional(name, contract)
    } else {
        Field::required(name, contract)
    })
}

/// Recognises `{"$type": T, "$default": v}` in field position.
fn defaulted_field(value: &Value) -> Result<Option<(Contract, Value)>, ContractError> {
    let Value::Object(entries) = value else {
        return Ok(None);
    };
    let Some(default) = entries.get(DEFAULT) else {
        return Ok(None);
    };
    if entries.keys().any(|key| key != DEFAULT && key != TYPE) {
        return Err(ContractError::MixedDirective {
            directive: DEFAULT.to_owned(),
        });
    }
    let contract = match entries.get(TYPE) {
        Some(inner) => parse(inner)?,
        None => Contract::Any,
    };
    Ok(Some((contract, default.clone())))
}

fn sole_entry<'a>(directive: &str, entries: &'a Map<String, Value>) -> Result<&'a Value, ContractError> {
    if entries.len() != 1 {
        return Err(ContractError::MixedDirective {
            directive: directive.to_owned(),
        });
    }
    entries
        .get(directive)
        .ok_or_else(|| malformed(directive, "a value"))
}

fn malformed(directive: &str, expected: &'static str) -> ContractError {
    ContractError::MalformedDirective {
        directive: directive.to_owned(),
        expected,
    }
}

pub(super) fn render(contract: &Contract) -> Value {
    match contract {
        Contract::Any => Value::from("any"),
        Contract::Null => Value::Null,
        Contract::Boolean => Value::from("boolean"),
        Contract::Number => Value::from("number"),
        Contract::Integer => Value::from("integer"),
        Contract::String => Value::from("string"),
        Contract::Literal(value @ (Value::Bool(_) | Value::Number(_))) => value.clone(),
        Contract::Literal(value) => directive(LITERAL, value.clone()),
        Contract::Array(None) => Value::Array(Vec::new()),
        Contract::Array(Some(item)) => Value::Array(vec![render(item)]),
        Contract::Object(fields) => Value::Object(fields.iter().map(render_field).collect()),
        Contract::Map(value) => directive(MAP, render(value)),
        Contract::OneOf(alternatives) => {
            directive(ONE_OF, Value::Array(alternatives.iter().map(render).collect()))
        }
    }
}

fn render_field(field: &Field) -> (String, Value) {
    let rendered = render(field.contract());
    match field.presence() {
        Presence::Required => (field.name().to_owned(), rendered),
        Presence::Optional => (format!("{}{OPTIONAL_MARKER}", field.name()), rendered),
        Presence::Default(default) => {
            let mut entries = Map::new();
            entries.insert(TYPE.to_owned(), rendered);
            entries.insert(DEFAULT.to_owned(), default.clone());
            (field.name().to_owned(), Value::Object(entries))
        }
    }
}

fn directive(key: &str, value: Value) -> Value {
    let mut entries = Map::new();
    entries.insert(key.to_owned(), value);
    Value::Object(entries)
}
