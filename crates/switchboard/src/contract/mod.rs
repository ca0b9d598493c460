//! Structural shape declarations for request and response bodies.
//!
//! A [`Contract`] describes the shape a JSON value must have. Commands declare
//! an ordered list of contracts for their inbound body and another for their
//! outbound result. Matching is structural: a value conforms when its type and
//! nested fields line up with the declaration, and the conforming value is
//! *normalized* on the way through (unknown object keys are dropped and
//! declared defaults are filled in).
//!
//! Contracts can be built in Rust or parsed from a compact JSON template:
//!
//! ```
//! use serde_json::json;
//! use switchboard::contract::Contract;
//!
//! let contract = Contract::try_from(json!({"id": "integer", "tag?": "string"}))
//!     .expect("valid template");
//! let normalized = contract.conform(&json!({"id": 7, "extra": true}));
//! assert_eq!(normalized, Some(json!({"id": 7})));
//! ```

mod matching;
mod template;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use self::matching::{OutputViolation, Selection, conform_output, select};

/// A structural shape declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Contract {
    /// Any value, kept unchanged.
    Any,
    /// JSON `null`.
    Null,
    /// A JSON boolean.
    Boolean,
    /// Any JSON number.
    Number,
    /// A JSON number with an integral representation.
    Integer,
    /// A JSON string.
    String,
    /// Exactly the given value.
    Literal(Value),
    /// An array; when an item contract is present every element must match it.
    Array(Option<Box<Contract>>),
    /// An object with the declared fields; undeclared keys are stripped.
    Object(Vec<Field>),
    /// An object with arbitrary keys whose values all match the contract.
    Map(Box<Contract>),
    /// The first alternative that matches.
    OneOf(Vec<Contract>),
}

impl Contract {
    /// Builds an array contract whose elements must match `item`.
    #[must_use]
    pub fn array_of(item: Self) -> Self {
        Self::Array(Some(Box::new(item)))
    }

    /// Builds an object contract from its fields.
    #[must_use]
    pub fn object(fields: impl IntoIterator<Item = Field>) -> Self {
        Self::Object(fields.into_iter().collect())
    }

    /// Builds a map contract whose values must match `value`.
    #[must_use]
    pub fn map_of(value: Self) -> Self {
        Self::Map(Box::new(value))
    }

    /// Builds a literal contract.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Renders the contract in its JSON template form.
    #[must_use]
    pub fn to_template(&self) -> Value {
        template::render(self)
    }
}

impl TryFrom<Value> for Contract {
    type Error = ContractError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        template::parse(&value)
    }
}

impl From<Contract> for Value {
    fn from(contract: Contract) -> Self {
        contract.to_template()
    }
}

/// Whether an object field must be present.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    /// The field must be present.
    Required,
    /// The field may be absent; absent fields stay absent.
    Optional,
    /// The field may be absent; absent fields take the given value.
    Default(Value),
}

/// A named field of an object contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    contract: Contract,
    presence: Presence,
}

impl Field {
    /// Declares a field that must be present.
    #[must_use]
    pub fn required(name: impl Into<String>, contract: Contract) -> Self {
        Self {
            name: name.into(),
            contract,
            presence: Presence::Required,
        }
    }

    /// Declares a field that may be absent.
    #[must_use]
    pub fn optional(name: impl Into<String>, contract: Contract) -> Self {
        Self {
            name: name.into(),
            contract,
            presence: Presence::Optional,
        }
    }

    /// Declares a field that takes `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::InvalidDefault`] when `default` does not
    /// itself satisfy `contract`.
    pub fn with_default(
        name: impl Into<String>,
        contract: Contract,
        default: Value,
    ) -> Result<Self, ContractError> {
        let field_name = name.into();
        let Some(normalized) = contract.conform(&default) else {
            return Err(ContractError::InvalidDefault { field: field_name });
        };
        Ok(Self {
            name: field_name,
            contract,
            presence: Presence::Default(normalized),
        })
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field's contract.
    #[must_use]
    pub const fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Returns the field's presence rule.
    #[must_use]
    pub const fn presence(&self) -> &Presence {
        &self.presence
    }
}

/// Errors raised while parsing a contract template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// A string template names no known type.
    #[error("unknown contract type '{name}'")]
    UnknownType {
        /// The unrecognised type name.
        name: String,
    },
    /// An array template declared more than one item contract.
    #[error("array templates take at most one item contract, found {count}")]
    AmbiguousArray {
        /// Number of item contracts found.
        count: usize,
    },
    /// An object template used an unrecognised `$` directive.
    #[error("unknown contract directive '{directive}'")]
    UnknownDirective {
        /// The directive key.
        directive: String,
    },
    /// A directive object carried keys that do not belong with the directive.
    #[error("directive '{directive}' cannot be combined with other keys")]
    MixedDirective {
        /// The directive key.
        directive: String,
    },
    /// A directive carried a value of the wrong shape.
    #[error("directive '{directive}' expects {expected}")]
    MalformedDirective {
        /// The directive key.
        directive: String,
        /// Description of the expected value.
        expected: &'static str,
    },
    /// A `$default` appeared outside an object field.
    #[error("'$default' is only meaningful on an object field")]
    DefaultOutsideField,
    /// A field name was empty once its optional marker was removed.
    #[error("object fields must have a non-empty name")]
    EmptyFieldName,
    /// A field default does not satisfy the field's own contract.
    #[error("default for field '{field}' does not satisfy its contract")]
    InvalidDefault {
        /// Name of the offending field.
        field: String,
    },
}
