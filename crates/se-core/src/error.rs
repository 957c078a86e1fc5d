//! Fatal editing errors.
//!
//! Any of these aborts the current source, and with it the whole run. Soft
//! conditions (non-numeric values, zero matches) are logged instead.

use thiserror::Error;

/// A fatal problem with a rule document or with the data it refers to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The rule document is not shaped like a rule tree.
    #[error("malformed rule document: {0}")]
    Document(String),

    /// A node is missing an attribute it requires.
    #[error("<{node}> requires a {attribute} attribute")]
    MissingAttribute {
        node: String,
        attribute: &'static str,
    },

    /// A node that carries a text value has none.
    #[error("<{node}> requires a value")]
    MissingValue { node: String },

    /// A numeric or time literal failed to parse.
    #[error("<{node}> has invalid {field}: {value}")]
    InvalidLiteral {
        node: String,
        field: &'static str,
        value: String,
    },

    /// A node kind that is not valid where it appears.
    #[error("unknown <{kind}> inside <{parent}>")]
    UnknownNode { parent: String, kind: String },

    /// A node that may appear at most once appeared again.
    #[error("only one <{kind}> allowed per <{parent}>")]
    DuplicateNode { parent: String, kind: String },

    /// A referenced namespace does not exist.
    #[error("namespace {0} does not exist")]
    NamespaceNotFound(String),

    /// A referenced ID does not exist in its namespace.
    #[error("ID {id} does not exist in namespace {namespace}")]
    IdNotFound { namespace: String, id: String },

    /// A rename or copy would overwrite an existing namespace.
    #[error("namespace {0} already exists")]
    NamespaceExists(String),

    /// A namespace was asked to merge with itself.
    #[error("cannot merge namespace {0} into itself")]
    SelfMerge(String),

    /// A rename would collide with an existing ID.
    #[error("ID {id} already exists in namespace {namespace}")]
    IdExists { namespace: String, id: String },

    /// Trim window outside `0 <= start <= end`.
    #[error("invalid trim window [{start}, {end}]")]
    InvalidTrim { start: i64, end: i64 },

    /// Span over a namespace whose first and last entries coincide.
    #[error("cannot span namespace {0}: it covers no time")]
    ZeroSpan(String),

    /// Bound with neither a minimum nor a maximum.
    #[error("BoundID on {namespace} needs Min or Max")]
    MissingBounds { namespace: String },

    /// Repeated insert with an interval that never advances.
    #[error("insert interval must be positive, got {0}")]
    InvalidInterval(i64),

    /// Arithmetic requested on a value that is not a number.
    #[error("ID {id} in namespace {namespace} has non-numeric value {value}")]
    NonNumeric {
        namespace: String,
        id: String,
        value: String,
    },

    /// An operation that is not implemented for the entry it met.
    #[error("{operation} is not supported for data groups (namespace {namespace})")]
    Unsupported {
        operation: &'static str,
        namespace: String,
    },
}
