//! Introspection documents served on `<path>/help`.

use http::StatusCode;
use serde::Serialize;

use super::RegisteredCommand;
use crate::auth::AuthRequirement;
use crate::command::{Method, Visibility};
use crate::contract::Contract;
use crate::outcome::Outcome;

/// Describes a command to external tooling.
///
/// Contracts are rendered in their JSON template form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpDocument {
    name: String,
    description: String,
    link: String,
    path: String,
    method: Method,
    visibility: Visibility,
    auth: AuthRequirement,
    input_contracts: Vec<Contract>,
    output_contracts: Vec<Contract>,
}

impl HelpDocument {
    /// Builds the document for a registered command.
    #[must_use]
    pub fn describe(command: &RegisteredCommand) -> Self {
        let descriptor = command.descriptor();
        Self {
            name: descriptor.name().to_owned(),
            description: descriptor.description().to_owned(),
            link: descriptor.link().to_owned(),
            path: command.effective_path().to_owned(),
            method: descriptor.method(),
            visibility: descriptor.visibility(),
            auth: descriptor.auth().clone(),
            input_contracts: descriptor.input_contracts().to_vec(),
            output_contracts: descriptor.output_contracts().to_vec(),
        }
    }

    /// Returns the described command's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the described command's routable path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Renders the document as a `200 OK` outcome.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the document cannot be rendered.
    pub fn to_outcome(&self) -> Result<Outcome, serde_json::Error> {
        serde_json::to_value(self).map(|body| Outcome::with_status(body, StatusCode::OK))
    }
}
