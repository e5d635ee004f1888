use super::variables::{Binding, bind_variable};
use crate::flow::FlowPlan;
use crate::graph::{CommandNode, Graph, Node, VARIABLE_OUT};
use crate::ir::{ArgShape, MoveArg, NameAllocator, POp, PValue, PVar, ParamKind, Program};
use crate::registry::*;
use ahash::{AHashMap, AHashSet};
use tracing::{debug, trace};

/// Walks the active subgraph once and emits the program.
pub(super) struct ProgramBuilder<'a> {
    graph: &'a Graph,
    plan: &'a FlowPlan,
    names: NameAllocator,
    /// (node id, output port id) -> value available at that port.
    produced: AHashMap<(String, String), PValue>,
    program: Program,
}

impl<'a> ProgramBuilder<'a> {
    pub(super) fn new(graph: &'a Graph, plan: &'a FlowPlan, names: NameAllocator) -> Self {
        Self {
            graph,
            plan,
            names,
            produced: AHashMap::new(),
            program: Program::default(),
        }
    }

    pub(super) fn build(mut self) -> Program {
        self.bind_variables();
        for node_id in &self.plan.order {
            if let Some(Node::Command(node)) = self.graph.node(node_id) {
                let op = self.lower_command(node);
                trace!(node = %node.id, op = %op, "emitted op");
                self.program.ops.push(op);
            }
        }
        self.program
    }

    /// Variables feeding at least one active command, in declaration order.
    fn bind_variables(&mut self) {
        let used: AHashSet<&str> = self
            .graph
            .io_edges()
            .filter(|e| self.plan.order.iter().any(|id| *id == e.target))
            .map(|e| e.source.as_str())
            .collect();

        for node in &self.graph.nodes {
            let Node::Variable(var) = node else { continue };
            if !used.contains(var.id.as_str()) {
                continue;
            }
            let value = match bind_variable(var) {
                Binding::Inline(value) => value,
                Binding::Symbol(init) => {
                    let name = if var.var_type.is_vector() {
                        self.names.alloc_plural(&var.name)
                    } else {
                        self.names.alloc(&var.name)
                    };
                    self.program.vars.push(PVar {
                        name: name.clone(),
                        init,
                    });
                    PValue::Ref(name)
                }
            };
            self.produced
                .insert((var.id.clone(), VARIABLE_OUT.to_string()), value);
        }
    }

    /// Follows the edge into `port` back to the value its source produced.
    fn input(&self, node_id: &str, port: &str) -> PValue {
        let Some(edge) = self.graph.incoming_io(node_id, port) else {
            return PValue::Undef;
        };
        match self
            .produced
            .get(&(edge.source.clone(), edge.source_handle.clone()))
        {
            Some(value) => value.clone(),
            None => {
                debug!(
                    node = node_id,
                    port,
                    source = %edge.source,
                    "input is wired to a producer outside the active subgraph"
                );
                PValue::Undef
            }
        }
    }

    fn shape(
        &self,
        node_id: &str,
        expanded: bool,
        prefix: &str,
        vector_id: &str,
        count: usize,
    ) -> ArgShape {
        if expanded {
            ArgShape::Expanded(
                (0..count)
                    .map(|i| self.input(node_id, &indexed(prefix, i)))
                    .collect(),
            )
        } else {
            ArgShape::Vector(self.input(node_id, vector_id))
        }
    }

    fn bind_output(&mut self, node_id: &str, port: String, hint: &str) -> String {
        let name = self.names.alloc(hint);
        self.produced
            .insert((node_id.to_string(), port), PValue::Ref(name.clone()));
        name
    }

    fn lower_command(&mut self, node: &CommandNode) -> POp {
        let id = node.id.as_str();
        let expanded = node.command.is_expanded();
        match &node.command {
            Command::SplitCoins { amounts_count } => {
                let n = (*amounts_count).max(1);
                let coin = self.input(id, COIN_IN);
                let amounts = (0..n).map(|i| self.input(id, &indexed(AMOUNT_IN, i))).collect();
                let out = (0..n)
                    .map(|i| self.bind_output(id, indexed(COIN_OUT, i), "coin"))
                    .collect();
                POp::SplitCoins { coin, amounts, out }
            }
            Command::MergeCoins { sources_count, .. } => POp::MergeCoins {
                destination: self.input(id, DESTINATION_IN),
                sources: self.shape(id, expanded, SOURCE_IN, SOURCES_IN, (*sources_count).max(1)),
            },
            Command::TransferObjects { objects_count, .. } => POp::TransferObjects {
                objects: self.shape(id, expanded, OBJECT_IN, OBJECTS_IN, (*objects_count).max(1)),
                recipient: self.input(id, RECIPIENT_IN),
            },
            Command::MakeMoveVec {
                elem_type,
                elems_count,
                ..
            } => {
                let elems = self.shape(id, expanded, ELEM_IN, ELEMS_IN, *elems_count);
                let out = self.names.alloc_plural("item");
                self.produced
                    .insert((id.to_string(), VECTOR_OUT.to_string()), PValue::Ref(out.clone()));
                POp::MakeMoveVec {
                    elem_type: elem_type.to_move_type(),
                    elems,
                    out,
                }
            }
            Command::MoveCall(call) => {
                let type_args = (0..call.type_params.len())
                    .map(|i| self.input(id, &indexed(TYPE_ARG_IN, i)))
                    .collect();
                let args = call
                    .params
                    .iter()
                    .enumerate()
                    .map(|(i, declared)| {
                        let port = indexed(ARG_IN, i);
                        MoveArg {
                            kind: ParamKind::classify(declared),
                            value: self.input(id, &port),
                        }
                    })
                    .collect();
                let hint = format!("{}_result", call.function);
                let out = (0..call.returns.len())
                    .map(|i| self.bind_output(id, indexed(RETURN_OUT, i), &hint))
                    .collect();
                POp::MoveCall {
                    package: call.package.clone(),
                    module: call.module.clone(),
                    function: call.function.clone(),
                    type_args,
                    args,
                    out,
                }
            }
            Command::Publish(params) => POp::Publish {
                modules: params.modules.clone(),
                dependencies: params.dependencies.clone(),
                out: self.bind_output(id, UPGRADE_CAP_OUT.to_string(), "upgradeCap"),
            },
            Command::Upgrade(params) => POp::Upgrade {
                modules: params.modules.clone(),
                dependencies: params.dependencies.clone(),
                package: params.package.clone(),
                ticket: self.input(id, TICKET_IN),
                out: self.bind_output(id, RECEIPT_OUT.to_string(), "receipt"),
            },
        }
    }
}
