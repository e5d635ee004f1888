//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to build a graph, compile it,
//! lower it and decode transactions back.
//!
//! # Example
//!
//! ```rust,no_run
//! use ptbflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let document = PtbDocument::load("path/to/document.json")?;
//! let program = Compiler::builder(&document.graph).build().compile()?;
//! let source = emit_source(&program, &document.exec_options())?;
//! println!("{}", source.code);
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::graph::{Edge, Graph, Node, validate};

// Compilation and lowering
pub use crate::backend::{CallTrace, ExecOptions, LoweringBackend, lower};
pub use crate::compiler::Compiler;
pub use crate::emitter::{EmittedSource, emit_source};
pub use crate::executable::build_transaction;
pub use crate::ir::Program;

// Decoding
pub use crate::decoder::{Decoded, Decoder, Diagnostic, DiagnosticLevel};
pub use crate::tx::Transaction;

// Collaborators and persistence
pub use crate::collab::{ObjectMetadataProvider, SignatureProvider, SignatureSnapshot};
pub use crate::document::PtbDocument;

// Error types
pub use crate::error::{CompileError, ConnectError, DocumentError, LowerError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
