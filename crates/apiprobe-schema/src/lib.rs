//! # apiprobe-schema -- Response Contract Checking
//!
//! Loads the response set of a single OpenAPI operation and checks a
//! captured JSON body against every response label it declares.
//!
//! ## Pipeline
//!
//! 1. [`SchemaDocument`]: the parsed OpenAPI document (JSON or YAML).
//! 2. [`SchemaIndex::load`]: selects one operation, decodes each response
//!    label into a [`SchemaNode`] and resolves every reachable component
//!    reference. Broken documents fail here, never during validation.
//! 3. [`validate`]: checks one label against an [`ActualResponse`].
//! 4. [`run`]: checks every label and assembles a [`ValidationReport`].
//!
//! The body is checked against *all* labels, not only the one matching the
//! actual status code. The report shows which branches of the contract the
//! observed payload satisfies; [`ValidationReport::matching_label`] picks
//! out the one the status code selects.
//!
//! ## Crate Policy
//!
//! - No network access and no internal dependencies (leaf of the DAG).
//! - Validation is a pure function of the index and the response.
//! - No `.unwrap()` outside tests.

pub mod document;
pub mod error;
pub mod index;
pub mod node;
pub mod report;
pub mod validator;

pub use document::{HttpMethod, OperationKey, SchemaDocument};
pub use error::{SchemaLoadError, UnknownLabelError};
pub use index::SchemaIndex;
pub use node::{AdditionalProperties, CompositeMode, PrimitiveKind, SchemaNode};
pub use report::{label_matches, run, LabelMatch, ReportEntry, ValidationReport};
pub use validator::{validate, ActualResponse, ValidationResult, Violation, ViolationKind};
