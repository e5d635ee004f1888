//! The lowering contract shared by the executable builder and the source
//! emitter.
//!
//! [`lower`] owns the walk over a [`Program`]: it keeps the symbol
//! environment, resolves operands, memoizes pure encodings and decides when
//! a list of handles needs an implicit `makeMoveVec`. Backends only see
//! resolved handles and literals, so two backends fed the same program
//! receive the same sequence of calls.

use crate::error::{EncodeError, LowerError};
use crate::ir::{ArgShape, ObjectArg, POp, PValue, ParamKind, Program, Scalar};
use crate::registry::CommandKind;
use crate::types::NumericWidth;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Transaction-level settings supplied by the caller at lowering time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecOptions {
    /// Substituted for the wallet sentinel and recorded as the sender.
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub gas_budget: Option<u64>,
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_gas_budget(mut self, budget: u64) -> Self {
        self.gas_budget = Some(budget);
        self
    }
}

/// A fully resolved literal ready for pure encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Bool(bool),
    String(String),
    Address(String),
    Number(String),
    Numeric(NumericWidth, String),
    /// The sender placeholder when no sender was supplied.
    Sender,
    Bytes(Vec<u8>),
    List(Vec<Literal>),
}

impl Literal {
    fn with_sender(self, sender: Option<&str>) -> Literal {
        match (self, sender) {
            (Literal::Sender, Some(s)) => Literal::Address(s.to_string()),
            (Literal::List(items), Some(_)) => {
                Literal::List(items.into_iter().map(|l| l.with_sender(sender)).collect())
            }
            (other, _) => other,
        }
    }
}

/// A moveCall target as handed to a backend.
#[derive(Debug, Clone, Copy)]
pub struct CallTarget<'a> {
    pub package: &'a str,
    pub module: &'a str,
    pub function: &'a str,
    pub type_args: &'a [String],
}

/// One argument of an issued command, in a form both backends can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TraceArg {
    Pure {
        value_type: Option<String>,
        value: serde_json::Value,
    },
    /// Normalized object id.
    Object { id: String },
    Gas,
    Result { index: u16 },
    NestedResult { index: u16, result: u16 },
}

/// One issued command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracedCall {
    pub kind: CommandKind,
    /// `package::module::function` for calls, the package for upgrades,
    /// the element type for `makeMoveVec`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_args: Vec<String>,
    pub args: Vec<TraceArg>,
}

/// The ordered calls a backend issued. Equal traces mean equivalent
/// transactions.
pub type CallTrace = Vec<TracedCall>;

/// A consumer of lowered programs.
pub trait LoweringBackend {
    /// What an argument position receives: a transaction argument, an
    /// expression, and so on.
    type Handle: Clone;
    type Output;

    /// Backends that cannot represent the sender placeholder refuse programs
    /// using it when no sender is supplied.
    fn requires_sender(&self) -> bool {
        false
    }

    /// `symbol` names the variable the object came from, if any.
    fn object(
        &mut self,
        object: &ObjectArg,
        symbol: Option<&str>,
    ) -> Result<Self::Handle, EncodeError>;

    fn pure(
        &mut self,
        kind: &ParamKind,
        value: &Literal,
        symbol: Option<&str>,
    ) -> Result<Self::Handle, EncodeError>;

    // Command methods fail only when the transaction runs out of indices.

    fn split_coins(
        &mut self,
        coin: Self::Handle,
        amounts: Vec<Self::Handle>,
        out: &[String],
    ) -> Result<Vec<Self::Handle>, EncodeError>;

    fn merge_coins(
        &mut self,
        destination: Self::Handle,
        sources: Vec<Self::Handle>,
    ) -> Result<(), EncodeError>;

    fn transfer_objects(
        &mut self,
        objects: Vec<Self::Handle>,
        recipient: Self::Handle,
    ) -> Result<(), EncodeError>;

    /// `out` is absent for vectors the driver packs on its own.
    fn make_move_vec(
        &mut self,
        elem_type: Option<&str>,
        elems: Vec<Self::Handle>,
        out: Option<&str>,
    ) -> Result<Self::Handle, EncodeError>;

    fn move_call(
        &mut self,
        target: CallTarget<'_>,
        args: Vec<Self::Handle>,
        out: &[String],
    ) -> Result<Vec<Self::Handle>, EncodeError>;

    fn publish(
        &mut self,
        modules: &[String],
        dependencies: &[String],
        out: &str,
    ) -> Result<Self::Handle, EncodeError>;

    fn upgrade(
        &mut self,
        modules: &[String],
        dependencies: &[String],
        package: &str,
        ticket: Self::Handle,
        out: &str,
    ) -> Result<Self::Handle, EncodeError>;

    fn finish(self, options: &ExecOptions) -> Result<Self::Output, LowerError>;
}

/// Lowers `program` through `backend`.
pub fn lower<B: LoweringBackend>(
    program: &Program,
    backend: B,
    options: &ExecOptions,
) -> Result<B::Output, LowerError> {
    if backend.requires_sender() && options.sender.is_none() && program.uses_sender() {
        return Err(LowerError::MissingSender);
    }

    let mut walk = Walk {
        backend,
        env: AHashMap::new(),
        memo: AHashMap::new(),
        sender: options.sender.as_deref(),
    };
    for var in &program.vars {
        walk.env.insert(var.name.as_str(), Slot::Init(&var.init));
    }
    for (index, op) in program.ops.iter().enumerate() {
        let site = Site {
            op: index,
            kind: op.kind(),
        };
        walk.lower_op(site, op)?;
    }
    walk.backend.finish(options)
}

enum Slot<'p, H> {
    Init(&'p PValue),
    Bound(H),
}

enum Resolved<H> {
    Literal(Literal),
    Handle(H),
    List(Vec<Resolved<H>>),
}

#[derive(Clone, Copy)]
struct Site {
    op: usize,
    kind: CommandKind,
}

struct Walk<'p, B: LoweringBackend> {
    backend: B,
    env: AHashMap<&'p str, Slot<'p, B::Handle>>,
    /// (op index, kind, symbol) -> encoded handle.
    memo: AHashMap<(usize, ParamKind, String), B::Handle>,
    sender: Option<&'p str>,
}

impl<'p, B: LoweringBackend> Walk<'p, B> {
    fn lower_op(&mut self, site: Site, op: &'p POp) -> Result<(), LowerError> {
        let encode = move |source: EncodeError| LowerError::Encode {
            op: site.op,
            kind: site.kind,
            source,
        };
        match op {
            POp::SplitCoins { coin, amounts, out } => {
                let coin = self.handle(site, "coin", coin)?;
                let amounts = amounts
                    .iter()
                    .enumerate()
                    .map(|(i, amount)| {
                        let slot = format!("amount_{}", i);
                        self.arg(site, &slot, &ParamKind::Numeric(NumericWidth::U64), amount)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let handles = self
                    .backend
                    .split_coins(coin, amounts, out)
                    .map_err(encode)?;
                self.bind(out, handles);
            }
            POp::MergeCoins {
                destination,
                sources,
            } => {
                let destination = self.handle(site, "destination", destination)?;
                let sources = self.spread(site, "sources", &ParamKind::TxArg, sources)?;
                self.backend
                    .merge_coins(destination, sources)
                    .map_err(encode)?;
            }
            POp::TransferObjects { objects, recipient } => {
                let objects = self.spread(site, "objects", &ParamKind::TxArg, objects)?;
                let recipient = self.arg(site, "recipient", &ParamKind::Address, recipient)?;
                self.backend
                    .transfer_objects(objects, recipient)
                    .map_err(encode)?;
            }
            POp::MakeMoveVec {
                elem_type,
                elems,
                out,
            } => {
                let kind = elem_type
                    .as_deref()
                    .map(|t| ParamKind::classify(&crate::types::PtbType::parse_move(t)))
                    .unwrap_or(ParamKind::TxArg);
                let elems = self.spread(site, "elements", &kind, elems)?;
                let handle = self
                    .backend
                    .make_move_vec(elem_type.as_deref(), elems, Some(out))
                    .map_err(encode)?;
                self.env.insert(out.as_str(), Slot::Bound(handle));
            }
            POp::MoveCall {
                package,
                module,
                function,
                type_args,
                args,
                out,
            } => {
                let type_args = type_args
                    .iter()
                    .enumerate()
                    .map(|(i, t)| self.type_name(site, &format!("type_arg_{}", i), t))
                    .collect::<Result<Vec<_>, _>>()?;
                let args = args
                    .iter()
                    .enumerate()
                    .map(|(i, a)| self.arg(site, &format!("arg_{}", i), &a.kind, &a.value))
                    .collect::<Result<Vec<_>, _>>()?;
                let target = CallTarget {
                    package: package.as_str(),
                    module: module.as_str(),
                    function: function.as_str(),
                    type_args: &type_args,
                };
                let handles = self
                    .backend
                    .move_call(target, args, out)
                    .map_err(encode)?;
                self.bind(out, handles);
            }
            POp::Publish {
                modules,
                dependencies,
                out,
            } => {
                let handle = self
                    .backend
                    .publish(modules, dependencies, out)
                    .map_err(encode)?;
                self.env.insert(out.as_str(), Slot::Bound(handle));
            }
            POp::Upgrade {
                modules,
                dependencies,
                package,
                ticket,
                out,
            } => {
                let ticket = self.handle(site, "ticket", ticket)?;
                let handle = self
                    .backend
                    .upgrade(modules, dependencies, package, ticket, out)
                    .map_err(encode)?;
                self.env.insert(out.as_str(), Slot::Bound(handle));
            }
        }
        Ok(())
    }

    fn bind(&mut self, names: &'p [String], handles: Vec<B::Handle>) {
        for (name, handle) in names.iter().zip(handles) {
            self.env.insert(name.as_str(), Slot::Bound(handle));
        }
    }

    fn resolve(
        &mut self,
        site: Site,
        slot: &str,
        value: &'p PValue,
        symbol: Option<&'p str>,
    ) -> Result<Resolved<B::Handle>, LowerError> {
        let encode = |source: EncodeError| LowerError::Encode {
            op: site.op,
            kind: site.kind,
            source,
        };
        Ok(match value {
            PValue::Undef => {
                return Err(LowerError::UndefinedOperand {
                    op: site.op,
                    kind: site.kind,
                    slot: slot.to_string(),
                });
            }
            PValue::Ref(name) => match self.env.get(name.as_str()) {
                Some(Slot::Bound(handle)) => Resolved::Handle(handle.clone()),
                // Variable initializers never refer to other symbols.
                Some(Slot::Init(init)) if !matches!(init, PValue::Ref(_)) => {
                    let init: &'p PValue = *init;
                    return self.resolve(site, slot, init, Some(name.as_str()));
                }
                _ => {
                    return Err(LowerError::UnresolvedSymbol {
                        op: site.op,
                        kind: site.kind,
                        symbol: name.clone(),
                    });
                }
            },
            PValue::Scalar(scalar) => Resolved::Literal(match scalar {
                Scalar::Bool(b) => Literal::Bool(*b),
                Scalar::String(s) => Literal::String(s.clone()),
                Scalar::Address(a) => Literal::Address(a.clone()),
                Scalar::Number(n) => Literal::Number(n.clone()),
                Scalar::MyAddress => Literal::Sender,
                Scalar::Bytes(bytes) => Literal::Bytes(bytes.clone()),
            }),
            PValue::MoveNumeric { width, value } => {
                Resolved::Literal(Literal::Numeric(*width, value.clone()))
            }
            PValue::Object(object) => {
                Resolved::Handle(self.backend.object(object, symbol).map_err(encode)?)
            }
            PValue::Vector(items) => {
                let items = items
                    .iter()
                    .map(|item| self.resolve(site, slot, item, None))
                    .collect::<Result<Vec<_>, _>>()?;
                if items.iter().all(|i| matches!(i, Resolved::Literal(_))) {
                    Resolved::Literal(Literal::List(
                        items
                            .into_iter()
                            .filter_map(|i| match i {
                                Resolved::Literal(l) => Some(l),
                                _ => None,
                            })
                            .collect(),
                    ))
                } else {
                    Resolved::List(items)
                }
            }
        })
    }

    /// Encodes one resolved value for a position of kind `kind`.
    fn encode(
        &mut self,
        site: Site,
        kind: &ParamKind,
        value: Resolved<B::Handle>,
        symbol: Option<&str>,
    ) -> Result<B::Handle, LowerError> {
        match value {
            Resolved::Handle(handle) => Ok(handle),
            Resolved::Literal(literal) => {
                let key = symbol.map(|s| (site.op, kind.clone(), s.to_string()));
                if let Some(handle) = key.as_ref().and_then(|k| self.memo.get(k)) {
                    trace!(op = site.op, symbol, %kind, "reusing encoded argument");
                    return Ok(handle.clone());
                }
                let literal = literal.with_sender(self.sender);
                let handle = self
                    .backend
                    .pure(kind, &literal, symbol)
                    .map_err(|source| LowerError::Encode {
                        op: site.op,
                        kind: site.kind,
                        source,
                    })?;
                if let Some(key) = key {
                    self.memo.insert(key, handle.clone());
                }
                Ok(handle)
            }
            Resolved::List(items) => {
                let elem_kind = match kind {
                    ParamKind::Vector(inner) => inner.as_ref().clone(),
                    other => other.clone(),
                };
                let handles = items
                    .into_iter()
                    .map(|item| self.encode(site, &elem_kind, item, None))
                    .collect::<Result<Vec<_>, _>>()?;
                let elem_type = elem_kind.pure_type();
                trace!(op = site.op, elems = handles.len(), "packing handles into a vector");
                self.backend
                    .make_move_vec(elem_type.as_deref(), handles, None)
                    .map_err(|source| LowerError::Encode {
                        op: site.op,
                        kind: site.kind,
                        source,
                    })
            }
        }
    }

    fn arg(
        &mut self,
        site: Site,
        slot: &str,
        kind: &ParamKind,
        value: &'p PValue,
    ) -> Result<B::Handle, LowerError> {
        let symbol = match value {
            PValue::Ref(name) => Some(name.as_str()),
            _ => None,
        };
        let resolved = self.resolve(site, slot, value, symbol)?;
        self.encode(site, kind, resolved, symbol)
    }

    /// An operand that must already be an object or a command result.
    fn handle(
        &mut self,
        site: Site,
        slot: &str,
        value: &'p PValue,
    ) -> Result<B::Handle, LowerError> {
        match self.resolve(site, slot, value, symbol_of(value))? {
            Resolved::Handle(handle) => Ok(handle),
            Resolved::Literal(_) | Resolved::List(_) => Err(LowerError::OperandShape {
                op: site.op,
                kind: site.kind,
                slot: slot.to_string(),
                expected: "an object or command result",
            }),
        }
    }

    /// Flattens a variable-length operand group into one handle per element,
    /// keeping the shape the program chose.
    fn spread(
        &mut self,
        site: Site,
        slot: &str,
        kind: &ParamKind,
        shape: &'p ArgShape,
    ) -> Result<Vec<B::Handle>, LowerError> {
        match shape {
            ArgShape::Expanded(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| self.element(site, &format!("{}_{}", slot, i), kind, v))
                .collect(),
            ArgShape::Vector(value) => {
                let symbol = symbol_of(value);
                match self.resolve(site, slot, value, symbol)? {
                    Resolved::Handle(handle) => Ok(vec![handle]),
                    Resolved::List(items) => items
                        .into_iter()
                        .map(|item| self.element_resolved(site, slot, kind, item))
                        .collect(),
                    Resolved::Literal(Literal::List(items)) => items
                        .into_iter()
                        .map(|item| {
                            self.element_resolved(site, slot, kind, Resolved::Literal(item))
                        })
                        .collect(),
                    Resolved::Literal(_) => Err(LowerError::OperandShape {
                        op: site.op,
                        kind: site.kind,
                        slot: slot.to_string(),
                        expected: "a vector",
                    }),
                }
            }
        }
    }

    fn element(
        &mut self,
        site: Site,
        slot: &str,
        kind: &ParamKind,
        value: &'p PValue,
    ) -> Result<B::Handle, LowerError> {
        let symbol = symbol_of(value);
        let resolved = self.resolve(site, slot, value, symbol)?;
        match resolved {
            Resolved::Literal(_) if *kind == ParamKind::TxArg => Err(LowerError::OperandShape {
                op: site.op,
                kind: site.kind,
                slot: slot.to_string(),
                expected: "an object or command result",
            }),
            resolved => self.encode(site, kind, resolved, symbol),
        }
    }

    fn element_resolved(
        &mut self,
        site: Site,
        slot: &str,
        kind: &ParamKind,
        value: Resolved<B::Handle>,
    ) -> Result<B::Handle, LowerError> {
        match value {
            Resolved::Literal(_) if *kind == ParamKind::TxArg => Err(LowerError::OperandShape {
                op: site.op,
                kind: site.kind,
                slot: slot.to_string(),
                expected: "an object or command result",
            }),
            value => self.encode(site, kind, value, None),
        }
    }

    fn type_name(
        &mut self,
        site: Site,
        slot: &str,
        value: &'p PValue,
    ) -> Result<String, LowerError> {
        match self.resolve(site, slot, value, symbol_of(value))? {
            Resolved::Literal(Literal::String(name)) if !name.trim().is_empty() => {
                Ok(name.trim().to_string())
            }
            _ => Err(LowerError::OperandShape {
                op: site.op,
                kind: site.kind,
                slot: slot.to_string(),
                expected: "a Move type name",
            }),
        }
    }
}

fn symbol_of(value: &PValue) -> Option<&str> {
    match value {
        PValue::Ref(name) => Some(name),
        _ => None,
    }
}
