//! # Error Types
//!
//! Load-time failures are fatal for a run: nothing can be validated against
//! a document that does not describe the operation. A non-conforming body is
//! not an error and never appears here.

use thiserror::Error;

/// The schema document could not be turned into a [`crate::SchemaIndex`].
#[derive(Error, Debug)]
pub enum SchemaLoadError {
    /// The document file could not be read or parsed.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path to the document.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// The document has no entry under `paths` for the requested path.
    #[error("operation path '{path}' not found in schema document")]
    OperationNotFound {
        /// The requested path.
        path: String,
    },

    /// The path exists but does not declare the requested method.
    #[error("method {method} not declared for path '{path}'")]
    MethodNotFound {
        /// The requested path.
        path: String,
        /// The requested method, upper-case.
        method: String,
    },

    /// The operation declares no response labels.
    #[error("operation {operation} declares no responses")]
    EmptyResponses {
        /// Display form of the operation key.
        operation: String,
    },

    /// A `responses` key is neither a status code, a status class nor `default`.
    #[error("invalid response label '{label}' in {operation}")]
    InvalidLabel {
        /// The offending key.
        label: String,
        /// Display form of the operation key.
        operation: String,
    },

    /// A schema object is structurally malformed.
    #[error("invalid schema at {location}: {reason}")]
    InvalidSchema {
        /// Location of the schema within the document.
        location: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `$ref` names a component that the document does not define.
    #[error("unresolved reference '{reference}' at {location}")]
    UnresolvedReference {
        /// The `$ref` value.
        reference: String,
        /// Location of the `$ref` within the document.
        location: String,
    },

    /// A `$ref` points outside the document's component table.
    #[error("unsupported reference '{reference}' at {location}: only local component references are resolved")]
    UnsupportedReference {
        /// The `$ref` value.
        reference: String,
        /// Location of the `$ref` within the document.
        location: String,
    },
}

/// A label was requested that the operation does not declare.
///
/// Labels taken from [`crate::SchemaIndex::labels`] never produce this.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("response label '{label}' is not declared for {operation}")]
pub struct UnknownLabelError {
    /// The requested label.
    pub label: String,
    /// Display form of the operation key.
    pub operation: String,
}
