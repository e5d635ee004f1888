//! The linear intermediate form shared by both lowering backends.
//!
//! A [`Program`] never mentions node or edge ids: every operand is a resolved
//! [`PValue`], either a literal, a special object, or a reference to a symbol
//! bound by an earlier variable or operation.

pub mod artifact;
pub mod classify;
pub mod display;
pub mod names;

pub use classify::*;
pub use names::NameAllocator;

use crate::registry::CommandKind;
use crate::types::NumericWidth;
use serde::{Deserialize, Serialize};

/// Scalar literal payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scalar {
    Bool(bool),
    String(String),
    Address(String),
    /// Width-less decimal number; the width comes from where it is used.
    Number(String),
    /// The wallet sentinel, replaced by the sender at lowering time.
    MyAddress,
    /// Already-encoded pure bytes of an unknown type.
    Bytes(Vec<u8>),
}

/// Object operands. The special variants are shared system objects that
/// lowering addresses through dedicated helpers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectArg {
    Id(String),
    Gas,
    System,
    Clock,
    Random,
}

impl ObjectArg {
    /// The fixed on-chain id of a shared system object.
    pub fn system_id(&self) -> Option<&'static str> {
        match self {
            ObjectArg::System => Some("0x5"),
            ObjectArg::Clock => Some("0x6"),
            ObjectArg::Random => Some("0x8"),
            ObjectArg::Id(_) | ObjectArg::Gas => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PValue {
    /// An input port with no incoming edge.
    Undef,
    Ref(String),
    Scalar(Scalar),
    MoveNumeric { width: NumericWidth, value: String },
    Object(ObjectArg),
    Vector(Vec<PValue>),
}

impl PValue {
    pub fn symbol(name: impl Into<String>) -> Self {
        PValue::Ref(name.into())
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, PValue::Undef)
    }

    fn uses_sender(&self) -> bool {
        match self {
            PValue::Scalar(Scalar::MyAddress) => true,
            PValue::Vector(items) => items.iter().any(PValue::uses_sender),
            _ => false,
        }
    }

    fn refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            PValue::Ref(name) => out.push(name),
            PValue::Vector(items) => items.iter().for_each(|v| v.refs(out)),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PVar {
    pub name: String,
    pub init: PValue,
}

/// How a variable-length operand group reached the command: one value per
/// element, or a single vector value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgShape {
    Expanded(Vec<PValue>),
    Vector(PValue),
}

impl ArgShape {
    fn values(&self) -> Vec<&PValue> {
        match self {
            ArgShape::Expanded(values) => values.iter().collect(),
            ArgShape::Vector(value) => vec![value],
        }
    }
}

/// A moveCall argument together with its wire-encoding class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveArg {
    pub value: PValue,
    pub kind: ParamKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum POp {
    SplitCoins {
        coin: PValue,
        amounts: Vec<PValue>,
        out: Vec<String>,
    },
    MergeCoins {
        destination: PValue,
        sources: ArgShape,
    },
    TransferObjects {
        objects: ArgShape,
        recipient: PValue,
    },
    MakeMoveVec {
        /// Move spelling of the element type, absent for generic objects.
        elem_type: Option<String>,
        elems: ArgShape,
        out: String,
    },
    MoveCall {
        package: String,
        module: String,
        function: String,
        type_args: Vec<PValue>,
        args: Vec<MoveArg>,
        out: Vec<String>,
    },
    Publish {
        modules: Vec<String>,
        dependencies: Vec<String>,
        out: String,
    },
    Upgrade {
        modules: Vec<String>,
        dependencies: Vec<String>,
        package: String,
        ticket: PValue,
        out: String,
    },
}

impl POp {
    pub fn kind(&self) -> CommandKind {
        match self {
            POp::SplitCoins { .. } => CommandKind::SplitCoins,
            POp::MergeCoins { .. } => CommandKind::MergeCoins,
            POp::TransferObjects { .. } => CommandKind::TransferObjects,
            POp::MakeMoveVec { .. } => CommandKind::MakeMoveVec,
            POp::MoveCall { .. } => CommandKind::MoveCall,
            POp::Publish { .. } => CommandKind::Publish,
            POp::Upgrade { .. } => CommandKind::Upgrade,
        }
    }

    /// Every operand the op reads, in slot order.
    pub fn operands(&self) -> Vec<&PValue> {
        match self {
            POp::SplitCoins { coin, amounts, .. } => {
                std::iter::once(coin).chain(amounts.iter()).collect()
            }
            POp::MergeCoins {
                destination,
                sources,
            } => std::iter::once(destination).chain(sources.values()).collect(),
            POp::TransferObjects { objects, recipient } => {
                let mut values = objects.values();
                values.push(recipient);
                values
            }
            POp::MakeMoveVec { elems, .. } => elems.values(),
            POp::MoveCall {
                type_args, args, ..
            } => type_args
                .iter()
                .chain(args.iter().map(|a| &a.value))
                .collect(),
            POp::Publish { .. } => Vec::new(),
            POp::Upgrade { ticket, .. } => vec![ticket],
        }
    }

    /// Symbols this op binds.
    pub fn outputs(&self) -> Vec<&str> {
        match self {
            POp::SplitCoins { out, .. } | POp::MoveCall { out, .. } => {
                out.iter().map(String::as_str).collect()
            }
            POp::MakeMoveVec { out, .. } | POp::Publish { out, .. } | POp::Upgrade { out, .. } => {
                vec![out.as_str()]
            }
            POp::MergeCoins { .. } | POp::TransferObjects { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub vars: Vec<PVar>,
    pub ops: Vec<POp>,
}

impl Program {
    pub fn var(&self, name: &str) -> Option<&PVar> {
        self.vars.iter().find(|v| v.name == name)
    }

    /// Whether any operand or variable resolves to the wallet sentinel.
    pub fn uses_sender(&self) -> bool {
        self.vars.iter().any(|v| v.init.uses_sender())
            || self
                .ops
                .iter()
                .flat_map(POp::operands)
                .any(PValue::uses_sender)
    }

    /// Every bound symbol: variables first, then op outputs in op order.
    pub fn symbols(&self) -> Vec<&str> {
        self.vars
            .iter()
            .map(|v| v.name.as_str())
            .chain(self.ops.iter().flat_map(POp::outputs))
            .collect()
    }

    /// Symbols referenced by some operand but bound nowhere.
    pub fn dangling_refs(&self) -> Vec<&str> {
        let bound = self.symbols();
        let mut refs = Vec::new();
        for value in self.ops.iter().flat_map(POp::operands) {
            value.refs(&mut refs);
        }
        refs.retain(|r| !bound.contains(r));
        refs.dedup();
        refs
    }
}
