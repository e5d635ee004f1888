//! Graph to IR preprocessing.
//!
//! ```rust
//! use ptbflow::prelude::*;
//!
//! let mut graph = Graph::new();
//! graph.add_node(Node::start("start"));
//! graph.add_node(Node::end("end"));
//! graph.edges.push(Edge::flow("start", "end"));
//!
//! let program = Compiler::builder(&graph).build().compile().unwrap();
//! assert!(program.ops.is_empty());
//! ```

use crate::error::CompileError;
use crate::flow::{self, FlowPlan};
use crate::graph::Graph;
use crate::ir::{NameAllocator, Program};

#[cfg(feature = "debug-tools")]
use std::fs;

mod builder;
pub mod variables;

use builder::ProgramBuilder;

pub struct Compiler<'g> {
    graph: &'g Graph,
    reserved: Vec<String>,
    #[cfg_attr(not(feature = "debug-tools"), allow(dead_code))]
    debug_dir: Option<String>,
}

pub struct CompilerBuilder<'g> {
    graph: &'g Graph,
    reserved: Vec<String>,
    debug_dir: Option<String>,
}

impl<'g> CompilerBuilder<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self {
            graph,
            reserved: Vec::new(),
            debug_dir: None,
        }
    }

    /// Keeps generated symbols clear of identifiers the caller's own
    /// surrounding code already uses.
    pub fn with_reserved_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    /// Directory for IR dumps. Only honoured with the `debug-tools` feature.
    pub fn with_debug_dir(mut self, dir: impl Into<String>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Compiler<'g> {
        Compiler {
            graph: self.graph,
            reserved: self.reserved,
            debug_dir: self.debug_dir,
        }
    }
}

impl<'g> Compiler<'g> {
    pub fn builder(graph: &'g Graph) -> CompilerBuilder<'g> {
        CompilerBuilder::new(graph)
    }

    /// Analyzes the flow and emits the program for the active subgraph.
    ///
    /// Each call starts from a fresh name allocator, so compiling the same
    /// graph twice yields identical symbols.
    pub fn compile(&self) -> Result<Program, CompileError> {
        if self.graph.start().is_none() {
            return Err(CompileError::MissingControlNode("Start"));
        }
        if self.graph.end().is_none() {
            return Err(CompileError::MissingControlNode("End"));
        }

        let plan = flow::analyze(self.graph);
        let program = self.compile_plan(&plan);

        #[cfg(feature = "debug-tools")]
        if let Some(dir) = &self.debug_dir {
            self.write_debug_file(dir, "program.txt", &program.to_string());
        }

        Ok(program)
    }

    /// Compiles against an already computed flow plan.
    pub fn compile_plan(&self, plan: &FlowPlan) -> Program {
        let names = NameAllocator::seeded(self.reserved.iter().map(String::as_str));
        let program = ProgramBuilder::new(self.graph, plan, names).build();
        tracing::debug!(
            vars = program.vars.len(),
            ops = program.ops.len(),
            "compiled graph"
        );
        program
    }

    #[cfg(feature = "debug-tools")]
    fn write_debug_file(&self, dir: &str, file: &str, content: &str) {
        let path = std::path::Path::new(dir).join(file);
        if let Err(e) = fs::create_dir_all(dir).and_then(|_| fs::write(&path, content)) {
            tracing::warn!(path = %path.display(), error = %e, "could not write debug dump");
        }
    }
}
