//! # ptbflow - Graph Compiler for Programmable Transactions
//!
//! **ptbflow** is the compiler core behind a node-based editor for Sui
//! programmable transaction blocks. Users wire value sources and commands
//! into a graph; ptbflow turns that graph into a linear program and from
//! there into either a ready-to-sign transaction or TypeScript source. It
//! also goes the other way, turning an on-chain transaction back into an
//! editable graph.
//!
//! ## Core Workflow
//!
//! 1.  **Build a graph**: Add `Start`, `End`, variable and command nodes. Use
//!     [`graph::Graph::connect_io`] to get type-checked edges.
//! 2.  **Compile**: `Compiler::builder(&graph).build().compile()` finds the
//!     active Start-to-End path and emits an [`ir::Program`].
//! 3.  **Lower**: Pass the program to [`executable::build_transaction`] for a
//!     [`tx::Transaction`], or to [`emitter::emit_source`] for TypeScript.
//!     Both issue the same [`backend::CallTrace`].
//! 4.  **Decode**: [`decoder::Decoder`] rebuilds a graph from a transaction,
//!     with diagnostics for anything it had to approximate.
//!
//! ## Quick Start
//!
//! ```rust
//! use ptbflow::prelude::*;
//! use ptbflow::registry::{Command, CommandKind};
//! use ptbflow::types::PtbType;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let mut graph = Graph::new();
//!     graph.add_node(Node::start("start"));
//!     graph.add_node(Node::end("end"));
//!     graph.add_node(Node::variable("coin", "gas", PtbType::object(), None));
//!     graph.add_node(Node::variable("amt", "amount", PtbType::number(), Some(json!(1000))));
//!     graph.add_node(Node::variable("me", "myAddress", PtbType::address(), None));
//!     graph.add_node(Node::command("split", Command::SplitCoins { amounts_count: 1 }));
//!     graph.add_node(Node::command("send", Command::new(CommandKind::TransferObjects)));
//!
//!     graph.connect_flow("start", "split")?;
//!     graph.connect_flow("split", "send")?;
//!     graph.connect_flow("send", "end")?;
//!     graph.connect_io("coin", "out", "split", "in_coin")?;
//!     graph.connect_io("amt", "out", "split", "in_amount_0")?;
//!     graph.connect_io("split", "out_coin_0", "send", "in_object_0")?;
//!     graph.connect_io("me", "out", "send", "in_recipient")?;
//!
//!     let program = Compiler::builder(&graph).build().compile()?;
//!     let options = ExecOptions::new().with_sender("0x42");
//!
//!     let tx = build_transaction(&program, &options)?;
//!     let source = emit_source(&program, &options)?;
//!     assert_eq!(tx.call_trace(), source.trace);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod collab;
pub mod compiler;
pub mod decoder;
pub mod document;
pub mod emitter;
pub mod error;
pub mod executable;
pub mod flow;
pub mod graph;
pub mod ir;
pub mod prelude;
pub mod registry;
pub mod tx;
pub mod types;
