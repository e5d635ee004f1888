use super::{Edge, Graph, Node};
use super::edit::check_io_ports;
use super::{PortDirection, PortRole};
use ahash::{AHashMap, AHashSet};
use serde::Serialize;
use std::fmt;

/// What a structural issue is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum IssueTarget {
    Graph,
    Node(String),
    Edge(String),
}

/// A structural problem found in a graph. In-progress edits are expected to
/// produce these transiently, so they are reported rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphIssue {
    pub target: IssueTarget,
    pub message: String,
}

impl GraphIssue {
    fn graph(message: impl Into<String>) -> Self {
        Self {
            target: IssueTarget::Graph,
            message: message.into(),
        }
    }

    fn node(id: &str, message: impl Into<String>) -> Self {
        Self {
            target: IssueTarget::Node(id.to_string()),
            message: message.into(),
        }
    }

    fn edge(id: &str, message: impl Into<String>) -> Self {
        Self {
            target: IssueTarget::Edge(id.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            IssueTarget::Graph => write!(f, "graph: {}", self.message),
            IssueTarget::Node(id) => write!(f, "node '{}': {}", id, self.message),
            IssueTarget::Edge(id) => write!(f, "edge '{}': {}", id, self.message),
        }
    }
}

/// Checks ids, control markers, port references and edge legality.
pub fn validate(graph: &Graph) -> Vec<GraphIssue> {
    let mut issues = Vec::new();

    let mut node_ids = AHashSet::new();
    for node in &graph.nodes {
        if !node_ids.insert(node.id()) {
            issues.push(GraphIssue::node(node.id(), "duplicate node id"));
        }
    }

    let starts = graph
        .nodes
        .iter()
        .filter(|n| matches!(n, Node::Start { .. }))
        .count();
    let ends = graph
        .nodes
        .iter()
        .filter(|n| matches!(n, Node::End { .. }))
        .count();
    match starts {
        0 => issues.push(GraphIssue::graph("missing Start node")),
        1 => {}
        n => issues.push(GraphIssue::graph(format!("{} Start nodes, expected one", n))),
    }
    match ends {
        0 => issues.push(GraphIssue::graph("missing End node")),
        1 => {}
        n => issues.push(GraphIssue::graph(format!("{} End nodes, expected one", n))),
    }

    let mut edge_ids = AHashSet::new();
    // (node, handle) -> number of edges using it, for single-edge handles.
    let mut io_inputs: AHashMap<(&str, &str), usize> = AHashMap::new();
    let mut flow_handles: AHashMap<(&str, &str), usize> = AHashMap::new();

    for edge in &graph.edges {
        if !edge_ids.insert(edge.id()) {
            issues.push(GraphIssue::edge(edge.id(), "duplicate edge id"));
        }
        let Some(source) = graph.node(edge.source()) else {
            issues.push(GraphIssue::edge(
                edge.id(),
                format!("source node '{}' does not exist", edge.source()),
            ));
            continue;
        };
        let Some(target) = graph.node(edge.target()) else {
            issues.push(GraphIssue::edge(
                edge.id(),
                format!("target node '{}' does not exist", edge.target()),
            ));
            continue;
        };
        let Some(source_port) = source.port(edge.source_handle()) else {
            issues.push(GraphIssue::edge(
                edge.id(),
                format!("node '{}' has no port '{}'", source.id(), edge.source_handle()),
            ));
            continue;
        };
        let Some(target_port) = target.port(edge.target_handle()) else {
            issues.push(GraphIssue::edge(
                edge.id(),
                format!("node '{}' has no port '{}'", target.id(), edge.target_handle()),
            ));
            continue;
        };

        match edge {
            Edge::Flow(flow) => {
                if source_port.role != PortRole::Flow || target_port.role != PortRole::Flow {
                    issues.push(GraphIssue::edge(&flow.id, "flow edge attached to an io port"));
                } else if source_port.direction != PortDirection::Out
                    || target_port.direction != PortDirection::In
                {
                    issues.push(GraphIssue::edge(
                        &flow.id,
                        "flow edge runs against port direction",
                    ));
                }
                *flow_handles
                    .entry((flow.source.as_str(), flow.source_handle.as_str()))
                    .or_default() += 1;
                *flow_handles
                    .entry((flow.target.as_str(), flow.target_handle.as_str()))
                    .or_default() += 1;
            }
            Edge::Io(io) => {
                match check_io_ports(&source_port, &target_port) {
                    Ok(cast) if cast != io.cast => issues.push(GraphIssue::edge(
                        &io.id,
                        "numeric cast annotation does not match the port types",
                    )),
                    Ok(_) => {}
                    Err(e) => issues.push(GraphIssue::edge(&io.id, e.to_string())),
                }
                *io_inputs
                    .entry((io.target.as_str(), io.target_handle.as_str()))
                    .or_default() += 1;
            }
        }
    }

    let mut crowded: Vec<_> = io_inputs
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|((node, handle), count)| (node, handle, count, "input port"))
        .chain(
            flow_handles
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .map(|((node, handle), count)| (node, handle, count, "flow handle")),
        )
        .collect();
    crowded.sort();
    for (node, handle, count, what) in crowded {
        issues.push(GraphIssue::node(
            node,
            format!("{} '{}' has {} edges, at most one is allowed", what, handle, count),
        ));
    }

    issues
}
