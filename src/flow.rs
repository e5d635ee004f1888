//! Execution-order analysis over flow edges.

use crate::graph::{Graph, Node};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;
use tracing::warn;

/// The executable part of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowPlan {
    /// Active command node ids in execution order.
    pub order: Vec<String>,
    /// Every node on some Start→End flow path, Start and End included.
    pub active: AHashSet<String>,
}

impl FlowPlan {
    pub fn is_active(&self, node_id: &str) -> bool {
        self.active.contains(node_id)
    }
}

/// Computes the active subgraph and a deterministic topological order of its
/// commands. A graph without both control markers has nothing to execute.
pub fn analyze(graph: &Graph) -> FlowPlan {
    let (Some(start), Some(end)) = (graph.start(), graph.end()) else {
        return FlowPlan::default();
    };

    let mut forward: AHashMap<&str, Vec<&str>> = AHashMap::new();
    let mut backward: AHashMap<&str, Vec<&str>> = AHashMap::new();
    for edge in graph.flow_edges() {
        forward.entry(&edge.source).or_default().push(&edge.target);
        backward.entry(&edge.target).or_default().push(&edge.source);
    }

    let from_start = reachable(start.id(), &forward);
    let to_end = reachable(end.id(), &backward);
    let active: AHashSet<String> = graph
        .nodes
        .iter()
        .map(Node::id)
        .filter(|id| from_start.contains(id) && to_end.contains(id))
        .map(str::to_string)
        .collect();

    let order = topological_order(graph, start.id(), &active, &forward);
    let order = order
        .into_iter()
        .filter(|id| matches!(graph.node(id), Some(Node::Command(_))))
        .collect();

    FlowPlan { order, active }
}

fn reachable<'a>(root: &'a str, adjacency: &AHashMap<&'a str, Vec<&'a str>>) -> AHashSet<&'a str> {
    let mut seen = AHashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(next) = adjacency.get(id) {
            stack.extend(next.iter().copied());
        }
    }
    seen
}

/// Kahn's algorithm on the active subgraph. Start goes first; among other
/// ready nodes the one declared earlier in the graph wins.
fn topological_order(
    graph: &Graph,
    start_id: &str,
    active: &AHashSet<String>,
    forward: &AHashMap<&str, Vec<&str>>,
) -> Vec<String> {
    let position: AHashMap<&str, usize> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id(), i))
        .collect();

    let mut indegree: AHashMap<&str, usize> = active.iter().map(|id| (id.as_str(), 0)).collect();
    for (source, targets) in forward {
        if !active.contains(*source) {
            continue;
        }
        for target in targets {
            if let Some(d) = indegree.get_mut(target) {
                *d += 1;
            }
        }
    }

    let rank = |id: &str| -> (bool, usize) { (id != start_id, position[id]) };
    let mut ready: Vec<&str> = indegree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();
    ready.sort_by_key(|id| rank(id));
    let mut ready: VecDeque<&str> = ready.into();

    let mut order = Vec::with_capacity(active.len());
    while let Some(id) = ready.pop_front() {
        order.push(id.to_string());
        let mut released = Vec::new();
        for target in forward.get(id).into_iter().flatten() {
            if let Some(d) = indegree.get_mut(target) {
                *d -= 1;
                if *d == 0 {
                    released.push(*target);
                }
            }
        }
        if !released.is_empty() {
            ready.extend(released);
            ready.make_contiguous().sort_by_key(|id| rank(id));
        }
    }

    if order.len() < active.len() {
        warn!(
            stuck = active.len() - order.len(),
            "flow edges form a cycle; nodes on it are left out of the execution order"
        );
    }
    order
}
