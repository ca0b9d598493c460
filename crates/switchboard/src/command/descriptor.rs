//! The immutable declaration of a command.

use serde::{Deserialize, Serialize};

use super::{Method, Visibility};
use crate::auth::AuthRequirement;
use crate::contract::Contract;
use crate::secrecy::SecrecySpec;

/// Everything the engine needs to know about a command besides its hooks.
///
/// Descriptors are built in code with the `with_*` methods or deserialized
/// from JSON. In serialized form `version` is an integer where `-1` means
/// "unversioned".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    name: String,
    #[serde(default)]
    description: String,
    link: String,
    method: Method,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    auth: AuthRequirement,
    #[serde(default)]
    input_contracts: Vec<Contract>,
    #[serde(default)]
    output_contracts: Vec<Contract>,
    #[serde(default)]
    secrecy: SecrecySpec,
    #[serde(default, with = "version_repr")]
    version: Option<u32>,
}

impl CommandDescriptor {
    /// Declares a public, unversioned command open to every caller, with no
    /// contracts.
    #[must_use]
    pub fn new(name: impl Into<String>, method: Method, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            link: link.into(),
            method,
            visibility: Visibility::Public,
            auth: AuthRequirement::Allow,
            input_contracts: Vec::new(),
            output_contracts: Vec::new(),
            secrecy: SecrecySpec::default(),
            version: None,
        }
    }

    /// Sets the human-readable description shown in the help document.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the visibility.
    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Sets the access requirement.
    #[must_use]
    pub fn with_auth(mut self, auth: impl Into<AuthRequirement>) -> Self {
        self.auth = auth.into();
        self
    }

    /// Appends an input contract; earlier contracts take precedence.
    #[must_use]
    pub fn with_input(mut self, contract: Contract) -> Self {
        self.input_contracts.push(contract);
        self
    }

    /// Appends an output contract; earlier contracts take precedence.
    #[must_use]
    pub fn with_output(mut self, contract: Contract) -> Self {
        self.output_contracts.push(contract);
        self
    }

    /// Sets the secrecy shorthand.
    #[must_use]
    pub const fn with_secrecy(mut self, secrecy: SecrecySpec) -> Self {
        self.secrecy = secrecy;
        self
    }

    /// Places the command under `/v<version>`.
    #[must_use]
    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the link, the key used for direct invocation.
    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Returns the HTTP verb.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Returns the visibility.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns the access requirement.
    #[must_use]
    pub const fn auth(&self) -> &AuthRequirement {
        &self.auth
    }

    /// Returns the input contracts in precedence order.
    #[must_use]
    pub fn input_contracts(&self) -> &[Contract] {
        &self.input_contracts
    }

    /// Returns the output contracts in precedence order.
    #[must_use]
    pub fn output_contracts(&self) -> &[Contract] {
        &self.output_contracts
    }

    /// Returns the secrecy shorthand.
    #[must_use]
    pub const fn secrecy(&self) -> SecrecySpec {
        self.secrecy
    }

    /// Returns the version, `None` when unversioned.
    #[must_use]
    pub const fn version(&self) -> Option<u32> {
        self.version
    }

    /// Returns the routable path under `prefix`.
    #[must_use]
    pub fn effective_path(&self, prefix: &str) -> String {
        self.version.map_or_else(
            || format!("{prefix}{}", self.link),
            |version| format!("{prefix}/v{version}{}", self.link),
        )
    }
}

mod version_repr {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    const UNVERSIONED: i64 = -1;

    #[expect(clippy::ref_option, reason = "signature fixed by serde's `with` attribute")]
    pub(super) fn serialize<S>(version: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(version.map_or(UNVERSIONED, i64::from))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        if raw == UNVERSIONED {
            return Ok(None);
        }
        u32::try_from(raw).map(Some).map_err(|_| {
            D::Error::custom(format!(
                "version must be {UNVERSIONED} or a non-negative 32-bit integer, found {raw}"
            ))
        })
    }
}
