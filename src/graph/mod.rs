//! The editor graph: control markers, variables, commands and the edges between them.

pub mod edit;
pub mod port;
pub mod validate;

pub use edit::*;
pub use port::*;
pub use validate::*;

use crate::registry::{Command, CommandKind};
use crate::types::{NumericWidth, PtbType};
use serde::{Deserialize, Serialize};

/// A value source: a literal typed by the editor, or an external object id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableNode {
    pub id: String,
    pub name: String,
    pub var_type: PtbType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandNode {
    pub id: String,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Start { id: String },
    End { id: String },
    Variable(VariableNode),
    Command(CommandNode),
}

impl Node {
    pub fn start(id: impl Into<String>) -> Self {
        Node::Start { id: id.into() }
    }

    pub fn end(id: impl Into<String>) -> Self {
        Node::End { id: id.into() }
    }

    pub fn variable(
        id: impl Into<String>,
        name: impl Into<String>,
        var_type: PtbType,
        value: Option<serde_json::Value>,
    ) -> Self {
        Node::Variable(VariableNode {
            id: id.into(),
            name: name.into(),
            var_type,
            value,
        })
    }

    pub fn command(id: impl Into<String>, command: Command) -> Self {
        Node::Command(CommandNode {
            id: id.into(),
            command,
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Node::Start { id } | Node::End { id } => id,
            Node::Variable(v) => &v.id,
            Node::Command(c) => &c.id,
        }
    }

    pub fn command_kind(&self) -> Option<CommandKind> {
        match self {
            Node::Command(c) => Some(c.command.kind()),
            _ => None,
        }
    }

    /// Derives the node's ports from its payload.
    pub fn ports(&self) -> Vec<Port> {
        match self {
            Node::Start { .. } => vec![Port::flow_out()],
            Node::End { .. } => vec![Port::flow_in()],
            Node::Variable(v) => vec![Port::io_out(VARIABLE_OUT, v.var_type.clone())],
            Node::Command(c) => c.command.ports(),
        }
    }

    pub fn port(&self, port_id: &str) -> Option<Port> {
        self.ports().into_iter().find(|p| p.id == port_id)
    }
}

/// Marks an io edge whose `number` source is narrowed to a Move width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericCast {
    pub to: NumericWidth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub source_handle: String,
    pub target: String,
    pub target_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IoEdge {
    pub id: String,
    pub source: String,
    pub source_handle: String,
    pub target: String,
    pub target_handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast: Option<NumericCast>,
}

impl FlowEdge {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            id: edge_id(source, FLOW_OUT, target, FLOW_IN),
            source: source.to_string(),
            source_handle: FLOW_OUT.to_string(),
            target: target.to_string(),
            target_handle: FLOW_IN.to_string(),
        }
    }
}

impl IoEdge {
    pub fn new(source: &str, source_handle: &str, target: &str, target_handle: &str) -> Self {
        Self {
            id: edge_id(source, source_handle, target, target_handle),
            source: source.to_string(),
            source_handle: source_handle.to_string(),
            target: target.to_string(),
            target_handle: target_handle.to_string(),
            cast: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Edge {
    Flow(FlowEdge),
    Io(IoEdge),
}

impl Edge {
    /// A flow edge from `source`'s flow-out to `target`'s flow-in.
    pub fn flow(source: &str, target: &str) -> Self {
        Edge::Flow(FlowEdge::new(source, target))
    }

    /// An io edge without a cast annotation. Use [`Graph::connect_io`] to get
    /// a validated, annotated edge.
    pub fn io(source: &str, source_handle: &str, target: &str, target_handle: &str) -> Self {
        Edge::Io(IoEdge::new(source, source_handle, target, target_handle))
    }

    pub fn id(&self) -> &str {
        match self {
            Edge::Flow(e) => &e.id,
            Edge::Io(e) => &e.id,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Edge::Flow(e) => &e.source,
            Edge::Io(e) => &e.source,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Edge::Flow(e) => &e.target,
            Edge::Io(e) => &e.target,
        }
    }

    pub fn source_handle(&self) -> &str {
        match self {
            Edge::Flow(e) => &e.source_handle,
            Edge::Io(e) => &e.source_handle,
        }
    }

    pub fn target_handle(&self) -> &str {
        match self {
            Edge::Flow(e) => &e.target_handle,
            Edge::Io(e) => &e.target_handle,
        }
    }

    pub fn as_io(&self) -> Option<&IoEdge> {
        match self {
            Edge::Io(e) => Some(e),
            Edge::Flow(_) => None,
        }
    }

    pub fn as_flow(&self) -> Option<&FlowEdge> {
        match self {
            Edge::Flow(e) => Some(e),
            Edge::Io(_) => None,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source() == node_id || self.target() == node_id
    }
}

/// Deterministic edge id derived from both endpoints.
pub fn edge_id(source: &str, source_handle: &str, target: &str, target_handle: &str) -> String {
    format!("{}:{}->{}:{}", source, source_handle, target, target_handle)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    pub fn start(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| matches!(n, Node::Start { .. }))
    }

    pub fn end(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| matches!(n, Node::End { .. }))
    }

    pub fn flow_edges(&self) -> impl Iterator<Item = &FlowEdge> {
        self.edges.iter().filter_map(Edge::as_flow)
    }

    pub fn io_edges(&self) -> impl Iterator<Item = &IoEdge> {
        self.edges.iter().filter_map(Edge::as_io)
    }

    /// The io edge feeding a given input port, if any.
    pub fn incoming_io(&self, node_id: &str, port_id: &str) -> Option<&IoEdge> {
        self.io_edges()
            .find(|e| e.target == node_id && e.target_handle == port_id)
    }
}
