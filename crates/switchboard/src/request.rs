//! Per-call request data.
//!
//! A [`RawRequest`] is what a transport binding or a direct caller hands to the
//! dispatcher. Every part is optional; missing parts read as empty. The
//! dispatcher turns it into the [`RequestContext`] a command's business logic
//! receives once the body has been matched against the command's input
//! contracts.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

/// String-keyed, string-valued request component (headers, query, ...).
pub type StringMap = BTreeMap<String, String>;

/// Uploaded files keyed by form field, in upload order.
pub type FileMap = BTreeMap<String, Vec<UploadedFile>>;

/// A file decoded from a multipart upload by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    name: String,
    mime_type: Option<String>,
    data: Vec<u8>,
}

impl UploadedFile {
    /// Builds an uploaded file from its original name and contents.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            data: data.into(),
        }
    }

    /// Records the MIME type the client declared.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Returns the client-supplied file name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared MIME type.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// Returns the file contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Unvalidated inputs for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRequest {
    headers: StringMap,
    body: Option<Value>,
    path_vars: StringMap,
    query: StringMap,
    files: FileMap,
    cookies: StringMap,
    path: Option<String>,
}

impl RawRequest {
    /// Creates a request with every part empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a path variable.
    #[must_use]
    pub fn with_path_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_vars.insert(name.into(), value.into());
        self
    }

    /// Adds a query value.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Adds an uploaded file under its form field name.
    ///
    /// Repeated fields accumulate; earlier uploads are kept.
    #[must_use]
    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.entry(field.into()).or_default().push(file);
        self
    }

    /// Adds a cookie.
    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Sets the concrete path the transport matched.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Returns the body, or an empty JSON object when none was supplied.
    #[must_use]
    pub fn body_or_empty(&self) -> Value {
        self.body
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Consumes the request into a context for business logic.
    ///
    /// `path` is used when the transport did not report a concrete path.
    pub(crate) fn into_context(
        self,
        template: Option<usize>,
        body: Option<Value>,
        path: &str,
    ) -> RequestContext {
        RequestContext {
            template,
            body,
            headers: self.headers,
            path_vars: self.path_vars,
            query: self.query,
            files: self.files,
            cookies: self.cookies,
            path: self.path.unwrap_or_else(|| path.to_owned()),
        }
    }
}

/// Validated inputs handed to a command's business logic.
///
/// Each context is owned by exactly one call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    template: Option<usize>,
    body: Option<Value>,
    headers: StringMap,
    path_vars: StringMap,
    query: StringMap,
    files: FileMap,
    cookies: StringMap,
    path: String,
}

impl RequestContext {
    /// Returns the index of the input contract the body matched.
    ///
    /// `None` when the command declares no input contracts.
    #[must_use]
    pub const fn template(&self) -> Option<usize> {
        self.template
    }

    /// Returns the normalized body.
    ///
    /// `None` when the command declares no input contracts.
    #[must_use]
    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &StringMap {
        &self.headers
    }

    /// Returns the path variables.
    #[must_use]
    pub const fn path_vars(&self) -> &StringMap {
        &self.path_vars
    }

    /// Returns a single path variable.
    #[must_use]
    pub fn path_var(&self, name: &str) -> Option<&str> {
        self.path_vars.get(name).map(String::as_str)
    }

    /// Returns the query values.
    #[must_use]
    pub const fn query(&self) -> &StringMap {
        &self.query
    }

    /// Returns the uploaded files keyed by form field.
    #[must_use]
    pub const fn files(&self) -> &FileMap {
        &self.files
    }

    /// Returns the files uploaded under `field`, empty when there were none.
    #[must_use]
    pub fn field_files(&self, field: &str) -> &[UploadedFile] {
        self.files.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the cookies.
    #[must_use]
    pub const fn cookies(&self) -> &StringMap {
        &self.cookies
    }

    /// Returns the resolved path of the call.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}
