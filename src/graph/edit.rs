//! Editing operations the editor performs on a graph.
//!
//! Ports are derived from node payloads, so any payload change is followed by
//! a prune pass that drops edges whose endpoints no longer exist or no longer
//! type-check.

use super::{Edge, FlowEdge, Graph, IoEdge, Node, NumericCast, Port, PortDirection, PortRole};
use crate::collab::ObjectMetadataProvider;
use crate::error::{CollaboratorError, ConnectError};
use crate::registry::Command;
use crate::types::{PtbType, infer_cast_target, is_type_compatible};
use tracing::debug;

/// Checks that `source` may feed `target` and computes the cast annotation.
pub fn check_io_ports(source: &Port, target: &Port) -> Result<Option<NumericCast>, ConnectError> {
    if source.role != PortRole::Io || target.role != PortRole::Io {
        return Err(ConnectError::RoleMismatch {
            source_role: format!("{:?}", source.role).to_lowercase(),
            target_role: format!("{:?}", target.role).to_lowercase(),
        });
    }
    if source.direction != PortDirection::Out || target.direction != PortDirection::In {
        return Err(ConnectError::DirectionMismatch);
    }
    let source_type = source.type_or_unknown();
    let target_type = target.type_or_unknown();
    if !is_type_compatible(&source_type, &target_type) {
        return Err(ConnectError::TypeMismatch {
            source_type: source_type.to_string(),
            target_type: target_type.to_string(),
        });
    }
    Ok(infer_cast_target(&source_type, &target_type).map(|to| NumericCast { to }))
}

fn check_flow_ports(source: &Port, target: &Port) -> Result<(), ConnectError> {
    if source.role != PortRole::Flow || target.role != PortRole::Flow {
        return Err(ConnectError::RoleMismatch {
            source_role: format!("{:?}", source.role).to_lowercase(),
            target_role: format!("{:?}", target.role).to_lowercase(),
        });
    }
    if source.direction != PortDirection::Out || target.direction != PortDirection::In {
        return Err(ConnectError::DirectionMismatch);
    }
    Ok(())
}

impl Graph {
    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Removes a node and every edge touching it.
    pub fn remove_node(&mut self, node_id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id() == node_id)?;
        self.edges.retain(|e| !e.touches(node_id));
        Some(self.nodes.remove(index))
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> Option<Edge> {
        let index = self.edges.iter().position(|e| e.id() == edge_id)?;
        Some(self.edges.remove(index))
    }

    fn resolve_port(&self, node_id: &str, port_id: &str) -> Result<Port, ConnectError> {
        let node = self
            .node(node_id)
            .ok_or_else(|| ConnectError::NodeNotFound(node_id.to_string()))?;
        node.port(port_id).ok_or_else(|| ConnectError::PortNotFound {
            node_id: node_id.to_string(),
            port_id: port_id.to_string(),
        })
    }

    /// Validates an io edge proposal without modifying the graph.
    pub fn propose_io(
        &self,
        source: &str,
        source_handle: &str,
        target: &str,
        target_handle: &str,
    ) -> Result<IoEdge, ConnectError> {
        if source == target {
            return Err(ConnectError::SelfLoop);
        }
        let source_port = self.resolve_port(source, source_handle)?;
        let target_port = self.resolve_port(target, target_handle)?;
        let cast = check_io_ports(&source_port, &target_port)?;
        let mut edge = IoEdge::new(source, source_handle, target, target_handle);
        edge.cast = cast;
        Ok(edge)
    }

    /// Connects two io ports. An input port holds a single edge, so any edge
    /// already feeding `target_handle` is replaced.
    pub fn connect_io(
        &mut self,
        source: &str,
        source_handle: &str,
        target: &str,
        target_handle: &str,
    ) -> Result<String, ConnectError> {
        let edge = self.propose_io(source, source_handle, target, target_handle)?;
        self.edges.retain(|e| match e {
            Edge::Io(io) => !(io.target == target && io.target_handle == target_handle),
            Edge::Flow(_) => true,
        });
        let id = edge.id.clone();
        self.edges.push(Edge::Io(edge));
        Ok(id)
    }

    /// Connects `source`'s flow-out to `target`'s flow-in, replacing whatever
    /// either handle was connected to before.
    pub fn connect_flow(&mut self, source: &str, target: &str) -> Result<String, ConnectError> {
        if source == target {
            return Err(ConnectError::SelfLoop);
        }
        let edge = FlowEdge::new(source, target);
        let source_port = self.resolve_port(source, &edge.source_handle)?;
        let target_port = self.resolve_port(target, &edge.target_handle)?;
        check_flow_ports(&source_port, &target_port)?;

        self.edges.retain(|e| match e {
            Edge::Flow(FlowEdge {
                source: s, target: t, ..
            }) => s != source && t != target,
            Edge::Io(_) => true,
        });
        let id = edge.id.clone();
        self.edges.push(Edge::Flow(edge));
        Ok(id)
    }

    /// Applies a UI-parameter change to a command node, then prunes edges that
    /// no longer fit the regenerated ports. Returns the ids of pruned edges.
    pub fn patch_command(
        &mut self,
        node_id: &str,
        patch: impl FnOnce(&mut Command),
    ) -> Result<Vec<String>, ConnectError> {
        match self.node_mut(node_id) {
            Some(Node::Command(node)) => patch(&mut node.command),
            Some(_) => {
                return Err(ConnectError::PortNotFound {
                    node_id: node_id.to_string(),
                    port_id: "command".to_string(),
                });
            }
            None => return Err(ConnectError::NodeNotFound(node_id.to_string())),
        }
        Ok(self.prune_stale_edges())
    }

    /// Changes a variable's type and prunes edges that stop type-checking.
    pub fn set_variable_type(
        &mut self,
        node_id: &str,
        var_type: PtbType,
    ) -> Result<Vec<String>, ConnectError> {
        match self.node_mut(node_id) {
            Some(Node::Variable(var)) => var.var_type = var_type,
            Some(_) => {
                return Err(ConnectError::PortNotFound {
                    node_id: node_id.to_string(),
                    port_id: super::VARIABLE_OUT.to_string(),
                });
            }
            None => return Err(ConnectError::NodeNotFound(node_id.to_string())),
        }
        Ok(self.prune_stale_edges())
    }

    /// Drops edges whose endpoints vanished or no longer type-check, and
    /// refreshes cast annotations on the survivors.
    pub fn prune_stale_edges(&mut self) -> Vec<String> {
        let mut pruned = Vec::new();
        let mut kept = Vec::with_capacity(self.edges.len());
        for edge in std::mem::take(&mut self.edges) {
            let source = self.resolve_port(edge.source(), edge.source_handle());
            let target = self.resolve_port(edge.target(), edge.target_handle());
            let verdict = match (&edge, source, target) {
                (Edge::Io(io), Ok(s), Ok(t)) => check_io_ports(&s, &t).map(|cast| {
                    let mut io = io.clone();
                    io.cast = cast;
                    Edge::Io(io)
                }),
                (Edge::Flow(_), Ok(s), Ok(t)) => check_flow_ports(&s, &t).map(|_| edge.clone()),
                (_, Err(e), _) | (_, _, Err(e)) => Err(e),
            };
            match verdict {
                Ok(edge) => kept.push(edge),
                Err(reason) => {
                    debug!(edge = %edge.id(), %reason, "pruning stale edge");
                    pruned.push(edge.id().to_string());
                }
            }
        }
        self.edges = kept;
        pruned
    }
}

/// Asks the object-metadata collaborator for a variable's concrete type tag
/// and narrows the variable from a generic object to that tag.
pub fn refine_object_type(
    graph: &mut Graph,
    node_id: &str,
    provider: &dyn ObjectMetadataProvider,
) -> Result<Option<String>, CollaboratorError> {
    let object_id = match graph.node(node_id) {
        Some(Node::Variable(var)) if var.var_type.is_object() => {
            match var.value.as_ref().and_then(|v| v.as_str()) {
                Some(id) => id.to_string(),
                None => return Ok(None),
            }
        }
        _ => return Ok(None),
    };
    let type_tag = provider.object_type(&object_id)?;
    if let Some(Node::Variable(var)) = graph.node_mut(node_id) {
        var.var_type = PtbType::object_of(type_tag.clone());
    }
    graph.prune_stale_edges();
    Ok(Some(type_tag))
}
