//! Decompiles a linear transaction back into an editable graph.
//!
//! Decoding never fails. Anything that cannot be represented faithfully is
//! reported as a [`Diagnostic`] next to a best-effort graph.

mod table;
mod wiring;

pub use table::{Producer, ValueKey, ValueTable};

use crate::backend::ExecOptions;
use crate::collab::{NoSignatures, SignatureProvider};
use crate::graph::{Edge, Graph, IoEdge, Node, NumericCast, VARIABLE_OUT};
use crate::registry::*;
use crate::tx::pure;
use crate::tx::{Transaction, TxArgument, TxCommand, TxInput, normalize_address};
use crate::types::{PtbType, infer_cast_target};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use wiring::PortPicker;

pub const START_ID: &str = "start";
pub const END_ID: &str = "end";
pub const GAS_ID: &str = "gas";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Warn => write!(f, "warn"),
            DiagnosticLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "[{}] {}: {}", self.level, node, self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}

/// A decoded graph plus everything worth telling the user about it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub graph: Graph,
    pub diagnostics: Vec<Diagnostic>,
    /// Sender and gas budget carried over from the transaction.
    pub options: ExecOptions,
}

impl Decoded {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == DiagnosticLevel::Error)
    }
}

pub struct Decoder<'a> {
    tx: &'a Transaction,
    signatures: &'a dyn SignatureProvider,
}

impl<'a> Decoder<'a> {
    pub fn new(tx: &'a Transaction) -> Self {
        Self {
            tx,
            signatures: &NoSignatures,
        }
    }

    /// Call signatures used to type moveCall ports.
    pub fn with_signatures(mut self, signatures: &'a dyn SignatureProvider) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn decode(&self) -> Decoded {
        let mut state = Decoding {
            tx: self.tx,
            signatures: self.signatures,
            graph: Graph::new(),
            table: ValueTable::new(),
            diagnostics: Vec::new(),
            packages: AHashMap::new(),
            arity: result_arity(self.tx),
            packed_inputs: Vec::new(),
        };
        state.run();
        debug!(
            nodes = state.graph.nodes.len(),
            edges = state.graph.edges.len(),
            diagnostics = state.diagnostics.len(),
            "decoded transaction"
        );
        Decoded {
            graph: state.graph,
            diagnostics: state.diagnostics,
            options: ExecOptions {
                sender: self.tx.sender.clone(),
                gas_budget: self.tx.gas_budget,
            },
        }
    }
}

/// Shorthand for `Decoder::new(tx).with_signatures(signatures).decode()`.
pub fn decode(tx: &Transaction, signatures: &dyn SignatureProvider) -> Decoded {
    Decoder::new(tx).with_signatures(signatures).decode()
}

/// How many results of each command later commands refer to.
fn result_arity(tx: &Transaction) -> AHashMap<u16, u16> {
    let mut arity: AHashMap<u16, u16> = AHashMap::new();
    for arg in tx.commands.iter().flat_map(TxCommand::arguments) {
        let (index, needed) = match arg {
            TxArgument::Result { index } => (index, 1),
            TxArgument::NestedResult {
                index,
                result_index,
            } => (index, result_index.saturating_add(1)),
            TxArgument::GasCoin | TxArgument::Input { .. } => continue,
        };
        let entry = arity.entry(index).or_default();
        *entry = (*entry).max(needed);
    }
    arity
}

fn input_id(index: usize) -> String {
    format!("input_{}", index)
}

fn command_id(index: usize) -> String {
    format!("cmd_{}", index)
}

/// A command payload, its argument slots and its typed outputs.
type CommandShape = (Command, Vec<(TxArgument, String)>, Vec<(String, PtbType)>);

/// Per-call decoding state.
struct Decoding<'a> {
    tx: &'a Transaction,
    signatures: &'a dyn SignatureProvider,
    graph: Graph,
    table: ValueTable,
    diagnostics: Vec<Diagnostic>,
    /// Package lookups, `None` when the provider had nothing.
    packages: AHashMap<String, Option<PackageSignatures>>,
    arity: AHashMap<u16, u16>,
    /// Input variables folded into a packed vector literal.
    packed_inputs: Vec<String>,
}

impl Decoding<'_> {
    fn diagnose(&mut self, level: DiagnosticLevel, node: Option<&str>, message: String) {
        match level {
            DiagnosticLevel::Info => debug!(node, "{}", message),
            DiagnosticLevel::Warn | DiagnosticLevel::Error => warn!(node, "{}", message),
        }
        self.diagnostics.push(Diagnostic {
            level,
            message,
            node: node.map(str::to_string),
        });
    }

    fn run(&mut self) {
        self.graph.add_node(Node::start(START_ID));
        self.graph.add_node(Node::end(END_ID));
        self.graph
            .add_node(Node::variable(GAS_ID, "gas", PtbType::object(), None));
        self.table
            .insert(ValueKey::Gas, GAS_ID, VARIABLE_OUT, PtbType::object());

        let tx = self.tx;
        for (index, input) in tx.inputs.iter().enumerate() {
            self.decode_input(index, input);
        }

        let mut previous = START_ID.to_string();
        for (index, command) in tx.commands.iter().enumerate() {
            if let Some(id) = self.decode_command(index, command) {
                self.graph.edges.push(Edge::flow(&previous, &id));
                previous = id;
            }
        }
        self.graph.edges.push(Edge::flow(&previous, END_ID));
        self.drop_packed_inputs();
    }

    fn decode_input(&mut self, index: usize, input: &TxInput) {
        let id = input_id(index);
        let (var_type, value) = match input {
            TxInput::Object { object_id } => (
                PtbType::object(),
                serde_json::Value::String(normalize_address(object_id)),
            ),
            TxInput::Pure { value_type, bytes } => {
                self.pure_input(&id, value_type.as_deref(), bytes)
            }
        };
        self.table.insert(
            ValueKey::Input(index as u16),
            &id,
            VARIABLE_OUT,
            var_type.clone(),
        );
        self.graph
            .add_node(Node::variable(id.clone(), id, var_type, Some(value)));
    }

    /// Types a pure input from its recorded Move type. Inputs whose type is
    /// missing or whose bytes do not decode are kept as raw hex.
    fn pure_input(
        &mut self,
        id: &str,
        value_type: Option<&str>,
        bytes: &[u8],
    ) -> (PtbType, serde_json::Value) {
        let raw = || serde_json::Value::String(format!("0x{}", hex::encode(bytes)));
        let Some(value_type) = value_type else {
            self.diagnose(
                DiagnosticLevel::Info,
                Some(id),
                "pure input has no recorded type; kept as raw bytes".to_string(),
            );
            return (PtbType::Unknown, raw());
        };
        match pure::decode(value_type, bytes) {
            Ok(value) => (PtbType::parse_move(value_type), value),
            Err(e) => {
                self.diagnose(
                    DiagnosticLevel::Warn,
                    Some(id),
                    format!(
                        "pure input of type {} does not decode ({}); kept as raw bytes",
                        value_type, e
                    ),
                );
                (PtbType::Unknown, raw())
            }
        }
    }

    /// Adds the node for one command and wires its arguments. Returns the
    /// node id, or `None` for commands the graph cannot express.
    fn decode_command(&mut self, index: usize, command: &TxCommand) -> Option<String> {
        let id = command_id(index);
        let c = index as u16;
        let mut packed: Option<String> = None;
        let (node_command, slots, outputs): CommandShape = match command {
            TxCommand::SplitCoins { coin, amounts } => {
                let n = amounts.len().max(1);
                let mut slots = vec![(*coin, COIN_IN.to_string())];
                slots.extend(
                    amounts
                        .iter()
                        .enumerate()
                        .map(|(i, a)| (*a, indexed(AMOUNT_IN, i))),
                );
                let outputs = (0..n)
                    .map(|i| (indexed(COIN_OUT, i), PtbType::object()))
                    .collect();
                (Command::SplitCoins { amounts_count: n }, slots, outputs)
            }
            TxCommand::MergeCoins {
                destination,
                sources,
            } => {
                let mut slots = vec![(*destination, DESTINATION_IN.to_string())];
                slots.extend(
                    sources
                        .iter()
                        .enumerate()
                        .map(|(i, s)| (*s, indexed(SOURCE_IN, i))),
                );
                let command = Command::MergeCoins {
                    sources_count: sources.len().max(1),
                    sources_expanded: true,
                };
                (command, slots, Vec::new())
            }
            TxCommand::TransferObjects { objects, address } => {
                let mut slots: Vec<_> = objects
                    .iter()
                    .enumerate()
                    .map(|(i, o)| (*o, indexed(OBJECT_IN, i)))
                    .collect();
                slots.push((*address, RECIPIENT_IN.to_string()));
                let command = Command::TransferObjects {
                    objects_count: objects.len().max(1),
                    objects_expanded: true,
                };
                (command, slots, Vec::new())
            }
            TxCommand::MakeMoveVec { type_arg, elements } => {
                // Without a type argument only objects can be packed.
                let elem_type = type_arg
                    .as_deref()
                    .map(PtbType::parse_move)
                    .unwrap_or_else(PtbType::object);
                let vector_mode = elem_type.is_vector();
                let slots = if !vector_mode {
                    elements
                        .iter()
                        .enumerate()
                        .map(|(i, e)| (*e, indexed(ELEM_IN, i)))
                        .collect()
                } else if let Some(var_id) = self.pack_elements(&id, &elem_type, elements) {
                    packed = Some(var_id);
                    Vec::new()
                } else {
                    if elements.len() > 1 {
                        self.diagnose(
                            DiagnosticLevel::Error,
                            Some(&id),
                            format!(
                                "{} vector elements are not all pure inputs of type {}; \
                                 only the first is kept",
                                elements.len(),
                                elem_type
                            ),
                        );
                    }
                    elements
                        .iter()
                        .take(1)
                        .map(|e| (*e, ELEMS_IN.to_string()))
                        .collect()
                };
                let outputs = vec![(
                    VECTOR_OUT.to_string(),
                    PtbType::vector(elem_type.clone()),
                )];
                let command = Command::MakeMoveVec {
                    elem_type,
                    elems_count: elements.len(),
                    elems_expanded: !vector_mode,
                };
                (command, slots, outputs)
            }
            TxCommand::MoveCall {
                package,
                module,
                function,
                type_arguments,
                arguments,
            } => {
                let params = self.move_call_params(
                    &id,
                    c,
                    package,
                    module,
                    function,
                    type_arguments,
                    arguments,
                );
                self.wire_type_args(&id, type_arguments);
                let slots = arguments
                    .iter()
                    .enumerate()
                    .map(|(i, a)| (*a, indexed(ARG_IN, i)))
                    .collect();
                let outputs = params
                    .returns
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| (indexed(RETURN_OUT, i), ty.clone()))
                    .collect();
                (Command::MoveCall(params), slots, outputs)
            }
            TxCommand::Publish {
                modules,
                dependencies,
            } => {
                let command = Command::Publish(PublishParams {
                    modules: modules.clone(),
                    dependencies: dependencies.clone(),
                });
                let outputs = vec![(
                    UPGRADE_CAP_OUT.to_string(),
                    PtbType::object_of(UPGRADE_CAP_TAG),
                )];
                (command, Vec::new(), outputs)
            }
            TxCommand::Upgrade {
                modules,
                dependencies,
                package,
                ticket,
            } => {
                let command = Command::Upgrade(UpgradeParams {
                    modules: modules.clone(),
                    dependencies: dependencies.clone(),
                    package: package.clone(),
                });
                let outputs = vec![(
                    RECEIPT_OUT.to_string(),
                    PtbType::object_of(UPGRADE_RECEIPT_TAG),
                )];
                (command, vec![(*ticket, TICKET_IN.to_string())], outputs)
            }
            TxCommand::Unsupported => {
                self.diagnose(
                    DiagnosticLevel::Error,
                    None,
                    format!(
                        "command #{} has a kind the editor cannot represent; skipped",
                        index
                    ),
                );
                return None;
            }
        };

        // Arguments resolve against earlier commands only, so the table is
        // consulted before this command's results are registered.
        let node = Node::command(id.clone(), node_command);
        let mut picker = PortPicker::new(&node);
        self.graph.add_node(node);
        for (arg, desired) in slots {
            self.wire(&id, &mut picker, arg, &desired);
        }
        if let Some(var_id) = packed {
            self.graph
                .edges
                .push(Edge::io(&var_id, VARIABLE_OUT, &id, ELEMS_IN));
        }
        for (result, (port, data_type)) in outputs.into_iter().enumerate() {
            self.table
                .insert_result(c, result as u16, &id, &port, data_type);
        }
        Some(id)
    }

    /// Folds the elements of a vector-of-vectors `makeMoveVec` into one
    /// literal variable. Only works when every element is a pure input of
    /// the element type; returns the new variable's id.
    fn pack_elements(
        &mut self,
        node_id: &str,
        elem_type: &PtbType,
        elements: &[TxArgument],
    ) -> Option<String> {
        let graph = &self.graph;
        let tx = self.tx;
        let sources = elements
            .iter()
            .map(|element| {
                let TxArgument::Input { index } = element else {
                    return None;
                };
                let index = *index as usize;
                let Some(TxInput::Pure { .. }) = tx.inputs.get(index) else {
                    return None;
                };
                let source = input_id(index);
                match graph.node(&source)? {
                    Node::Variable(var) if var.var_type == *elem_type => {
                        Some((source, var.value.clone()?))
                    }
                    _ => None,
                }
            })
            .collect::<Option<Vec<_>>>()?;

        let var_id = format!("{}_elems", node_id);
        let (inputs, values): (Vec<String>, Vec<serde_json::Value>) =
            sources.into_iter().unzip();
        self.diagnose(
            DiagnosticLevel::Info,
            Some(node_id),
            format!("packed {} pure inputs into {}", inputs.len(), var_id),
        );
        self.graph.add_node(Node::variable(
            var_id.clone(),
            var_id.clone(),
            PtbType::vector(elem_type.clone()),
            Some(serde_json::Value::Array(values)),
        ));
        self.packed_inputs.extend(inputs);
        Some(var_id)
    }

    /// Drops input variables whose only use was folded into a packed vector.
    fn drop_packed_inputs(&mut self) {
        for input in std::mem::take(&mut self.packed_inputs) {
            if !self.graph.edges.iter().any(|e| e.touches(&input)) {
                self.graph.remove_node(&input);
            }
        }
    }

    fn wire(&mut self, node_id: &str, picker: &mut PortPicker, arg: TxArgument, desired: &str) {
        let Some(producer) = self.table.get(arg).cloned() else {
            self.diagnose(
                DiagnosticLevel::Warn,
                Some(node_id),
                format!("argument {:?} does not refer to any earlier value", arg),
            );
            return;
        };
        let Some(port) = picker.pick(desired, &producer.data_type) else {
            self.diagnose(
                DiagnosticLevel::Warn,
                Some(node_id),
                format!("no free port for argument {:?}; dropped", arg),
            );
            return;
        };
        let target_type = port.type_or_unknown();
        if producer.data_type.is_vector()
            && !target_type.is_vector()
            && !target_type.is_wildcard()
        {
            self.diagnose(
                DiagnosticLevel::Info,
                Some(node_id),
                format!(
                    "vector {} passed through to {} without unpacking",
                    producer.data_type, port.id
                ),
            );
        } else if port.id != desired {
            self.diagnose(
                DiagnosticLevel::Info,
                Some(node_id),
                format!("argument {:?} wired to {} instead of {}", arg, port.id, desired),
            );
        }
        let mut edge = IoEdge::new(&producer.node, &producer.port, node_id, &port.id);
        edge.cast =
            infer_cast_target(&producer.data_type, &target_type).map(|to| NumericCast { to });
        self.graph.edges.push(Edge::Io(edge));
    }

    #[allow(clippy::too_many_arguments)]
    fn move_call_params(
        &mut self,
        node_id: &str,
        command: u16,
        package: &str,
        module: &str,
        function: &str,
        type_arguments: &[String],
        arguments: &[TxArgument],
    ) -> MoveCallParams {
        let mut params = MoveCallParams::new(package, module, function);
        match self.signature(node_id, package, module, function) {
            Some(signature) => {
                params.apply_signature(&signature);
                if params.params.len() != arguments.len() {
                    self.diagnose(
                        DiagnosticLevel::Warn,
                        Some(node_id),
                        format!(
                            "{} declares {} parameters but the call passes {}",
                            params.target(),
                            params.params.len(),
                            arguments.len()
                        ),
                    );
                }
            }
            None => self.diagnose(
                DiagnosticLevel::Warn,
                Some(node_id),
                format!("no signature for {}; ports are untyped", params.target()),
            ),
        }

        while params.params.len() < arguments.len() {
            params.params.push(PtbType::Unknown);
        }
        while params.type_params.len() < type_arguments.len() {
            params.type_params.push(format!("T{}", params.type_params.len()));
        }
        let needed = self.arity.get(&command).copied().unwrap_or(0) as usize;
        while params.returns.len() < needed {
            params.returns.push(PtbType::Unknown);
        }
        params
    }

    fn signature(
        &mut self,
        node_id: &str,
        package: &str,
        module: &str,
        function: &str,
    ) -> Option<FunctionSignature> {
        let key = normalize_address(package);
        if !self.packages.contains_key(&key) {
            let fetched = match self.signatures.package(package) {
                Ok(signatures) => Some(signatures),
                Err(e) => {
                    self.diagnose(DiagnosticLevel::Info, Some(node_id), e.to_string());
                    None
                }
            };
            self.packages.insert(key.clone(), fetched);
        }
        self.packages
            .get(&key)?
            .as_ref()?
            .function(module, function)
            .cloned()
    }

    /// Type arguments become string variables feeding the call's type ports.
    fn wire_type_args(&mut self, node_id: &str, type_arguments: &[String]) {
        for (i, type_arg) in type_arguments.iter().enumerate() {
            let var_id = format!("{}_targ_{}", node_id, i);
            self.graph.add_node(Node::variable(
                var_id.clone(),
                format!("type_arg_{}", i),
                PtbType::string(),
                Some(serde_json::Value::String(type_arg.clone())),
            ));
            self.graph.edges.push(Edge::io(
                &var_id,
                VARIABLE_OUT,
                node_id,
                &indexed(TYPE_ARG_IN, i),
            ));
        }
    }
}
