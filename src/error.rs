use crate::registry::CommandKind;
use thiserror::Error;

/// Errors that stop graph-to-IR compilation. Everything short of a missing
/// control marker degrades to `undef` operands instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("The graph has no {0} node")]
    MissingControlNode(&'static str),
}

/// Errors that abort a lowering call. They indicate a program that should not
/// have been produced from a valid graph, so nothing is substituted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LowerError {
    #[error("Operation #{op} ({kind}) references unknown symbol '{symbol}'")]
    UnresolvedSymbol {
        op: usize,
        kind: CommandKind,
        symbol: String,
    },

    #[error("Operation #{op} ({kind}) has no value for its {slot} operand")]
    UndefinedOperand {
        op: usize,
        kind: CommandKind,
        slot: String,
    },

    #[error("Operation #{op} ({kind}) expects a {expected} in its {slot} operand")]
    OperandShape {
        op: usize,
        kind: CommandKind,
        slot: String,
        expected: &'static str,
    },

    #[error("The program uses the sender placeholder but no sender address was supplied")]
    MissingSender,

    #[error("Sender '{0}' is not a valid address")]
    InvalidSender(String),

    #[error("Operation #{op} ({kind}): {source}")]
    Encode {
        op: usize,
        kind: CommandKind,
        #[source]
        source: EncodeError,
    },
}

/// Errors raised while converting a pure value to or from its wire bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("'{value}' is not a valid {width} value")]
    InvalidNumber { value: String, width: String },

    #[error("'{0}' is not a valid 32-byte address")]
    InvalidAddress(String),

    #[error("Cannot encode {value} as {kind}")]
    KindMismatch { kind: String, value: String },

    #[error("Values of kind {0} have no pure encoding")]
    Unencodable(String),

    #[error("Pure bytes ended early while reading {0}")]
    Truncated(String),

    #[error("{0} trailing bytes after the decoded value")]
    TrailingBytes(usize),

    #[error("Pure bytes are not valid for {ty}: {message}")]
    Malformed { ty: String, message: String },

    #[error("A transaction holds at most {limit} {what}")]
    TooMany { what: &'static str, limit: usize },
}

/// Reasons an edge proposal is rejected by the editor operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Node '{0}' does not exist")]
    NodeNotFound(String),

    #[error("Node '{node_id}' has no port '{port_id}'")]
    PortNotFound { node_id: String, port_id: String },

    #[error("Cannot connect a {source_role} port to a {target_role} port")]
    RoleMismatch {
        source_role: String,
        target_role: String,
    },

    #[error("Edges must run from an output port to an input port")]
    DirectionMismatch,

    #[error("Type {source_type} cannot flow into {target_type}")]
    TypeMismatch {
        source_type: String,
        target_type: String,
    },

    #[error("A node cannot be connected to itself")]
    SelfLoop,
}

/// Failure reported by an external collaborator. The core never retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("{what} '{key}' was not found")]
    NotFound { what: &'static str, key: String },

    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Errors loading or saving a persisted editor document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to parse document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document version {found} is not supported (expected at most {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Could not access document file '{path}': {message}")]
    Io { path: String, message: String },
}

/// Errors reading or writing a binary IR artifact.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("{0}")]
    Generic(String),
}
