//! Lowering into TypeScript source for `@mysten/sui/transactions`.
//!
//! The emitter performs the same calls as the executable builder but renders
//! each one as a statement. Arguments that come from a named variable are
//! hoisted into a `const` so that a value used twice reads as shared.

mod render;

use crate::backend::{
    CallTarget, CallTrace, ExecOptions, Literal, LoweringBackend, TraceArg, TracedCall, lower,
};
use crate::error::{EncodeError, LowerError};
use crate::ir::{NameAllocator, ObjectArg, ParamKind, Program};
use crate::registry::CommandKind;
use crate::tx::index_of;
use crate::tx::pure::{self, canonical};
use crate::tx::{format_address, normalize_address, parse_address};
use ahash::AHashMap;
use itertools::Itertools;
use serde::Serialize;
use std::fmt::Write;

/// Emitted program text together with the calls it performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedSource {
    pub code: String,
    pub trace: CallTrace,
}

/// An argument expression and the canonical value it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub expr: String,
    pub trace: TraceArg,
}

pub struct SourceEmitter {
    names: NameAllocator,
    body: Vec<String>,
    trace: CallTrace,
    /// Object handles already created, by normalized id.
    objects: AHashMap<String, Emitted>,
    declares_sender: bool,
    uses_hex: bool,
}

impl SourceEmitter {
    /// Symbols bound by `program` are kept out of the names the emitter
    /// allocates for hoisted constants.
    pub fn new(program: &Program) -> Self {
        let outputs = program.ops.iter().flat_map(|op| op.outputs());
        Self {
            names: NameAllocator::seeded(outputs),
            body: Vec::new(),
            trace: Vec::new(),
            objects: AHashMap::new(),
            declares_sender: false,
            uses_hex: false,
        }
    }

    fn next_command(&self) -> Result<u16, EncodeError> {
        index_of(self.trace.len(), "commands")
    }

    fn record(
        &mut self,
        kind: CommandKind,
        target: Option<String>,
        type_args: Vec<String>,
        args: Vec<TraceArg>,
    ) {
        self.trace.push(TracedCall {
            kind,
            target,
            type_args,
            args,
        });
    }

    fn hoist(&mut self, symbol: Option<&str>, expr: String) -> String {
        match symbol {
            Some(symbol) => {
                let name = self.names.alloc(symbol);
                self.body.push(format!("const {} = {};", name, expr));
                name
            }
            None => expr,
        }
    }
}

/// Lowers `program` into TypeScript source.
pub fn emit_source(program: &Program, options: &ExecOptions) -> Result<EmittedSource, LowerError> {
    lower(program, SourceEmitter::new(program), options)
}

fn exprs(values: &[Emitted]) -> String {
    values.iter().map(|v| v.expr.as_str()).join(", ")
}

fn traces(values: &[Emitted]) -> Vec<TraceArg> {
    values.iter().map(|v| v.trace.clone()).collect()
}

fn nested_results(index: u16, names: &[String]) -> Result<Vec<Emitted>, EncodeError> {
    index_of(names.len(), "results per command")?;
    Ok(names
        .iter()
        .enumerate()
        .map(|(i, name)| Emitted {
            expr: name.clone(),
            trace: TraceArg::NestedResult {
                index,
                result: i as u16,
            },
        })
        .collect())
}

impl LoweringBackend for SourceEmitter {
    type Handle = Emitted;
    type Output = EmittedSource;

    fn object(
        &mut self,
        object: &ObjectArg,
        symbol: Option<&str>,
    ) -> Result<Emitted, EncodeError> {
        let (id, expr) = match object {
            ObjectArg::Gas => {
                return Ok(Emitted {
                    expr: "tx.gas".to_string(),
                    trace: TraceArg::Gas,
                });
            }
            ObjectArg::Id(id) => {
                let normalized = format_address(&parse_address(id)?);
                (normalized, format!("tx.object({})", render::quoted(id.trim())))
            }
            ObjectArg::System => (normalize_address("0x5"), "tx.object.system()".to_string()),
            ObjectArg::Clock => (normalize_address("0x6"), "tx.object.clock()".to_string()),
            ObjectArg::Random => (normalize_address("0x8"), "tx.object.random()".to_string()),
        };
        if let Some(existing) = self.objects.get(&id) {
            return Ok(existing.clone());
        }
        let emitted = Emitted {
            expr: self.hoist(symbol, expr),
            trace: TraceArg::Object { id: id.clone() },
        };
        self.objects.insert(id, emitted.clone());
        Ok(emitted)
    }

    fn pure(
        &mut self,
        kind: &ParamKind,
        value: &Literal,
        symbol: Option<&str>,
    ) -> Result<Emitted, EncodeError> {
        if *value == Literal::Sender {
            self.declares_sender = true;
            let expr = self.hoist(symbol, "tx.pure.address(myAddress)".to_string());
            return Ok(Emitted {
                expr,
                trace: TraceArg::Pure {
                    value_type: Some("address".to_string()),
                    value: serde_json::Value::String("myAddress".to_string()),
                },
            });
        }
        let encoded = pure::encode(kind, value)?;
        let json = canonical(encoded.value_type.as_deref(), &encoded.bytes);
        let expr = match encoded.value_type.as_deref() {
            Some(ty) => render::pure_call(ty, &json),
            None => {
                self.uses_hex = true;
                format!("tx.pure(fromHex('{}'))", hex::encode(&encoded.bytes))
            }
        };
        Ok(Emitted {
            expr: self.hoist(symbol, expr),
            trace: TraceArg::Pure {
                value_type: encoded.value_type,
                value: json,
            },
        })
    }

    fn split_coins(
        &mut self,
        coin: Emitted,
        amounts: Vec<Emitted>,
        out: &[String],
    ) -> Result<Vec<Emitted>, EncodeError> {
        let index = self.next_command()?;
        self.body.push(format!(
            "const [{}] = tx.splitCoins({}, [{}]);",
            out.join(", "),
            coin.expr,
            exprs(&amounts)
        ));
        let mut args = vec![coin.trace];
        args.extend(traces(&amounts));
        self.record(CommandKind::SplitCoins, None, Vec::new(), args);
        nested_results(index, out)
    }

    fn merge_coins(
        &mut self,
        destination: Emitted,
        sources: Vec<Emitted>,
    ) -> Result<(), EncodeError> {
        self.next_command()?;
        self.body.push(format!(
            "tx.mergeCoins({}, [{}]);",
            destination.expr,
            exprs(&sources)
        ));
        let mut args = vec![destination.trace];
        args.extend(traces(&sources));
        self.record(CommandKind::MergeCoins, None, Vec::new(), args);
        Ok(())
    }

    fn transfer_objects(
        &mut self,
        objects: Vec<Emitted>,
        recipient: Emitted,
    ) -> Result<(), EncodeError> {
        self.next_command()?;
        self.body.push(format!(
            "tx.transferObjects([{}], {});",
            exprs(&objects),
            recipient.expr
        ));
        let mut args = traces(&objects);
        args.push(recipient.trace);
        self.record(CommandKind::TransferObjects, None, Vec::new(), args);
        Ok(())
    }

    fn make_move_vec(
        &mut self,
        elem_type: Option<&str>,
        elems: Vec<Emitted>,
        out: Option<&str>,
    ) -> Result<Emitted, EncodeError> {
        let index = self.next_command()?;
        let name = match out {
            Some(out) => out.to_string(),
            None => self.names.alloc("items"),
        };
        let type_field = elem_type
            .map(|t| format!("type: {}, ", render::quoted(t)))
            .unwrap_or_default();
        self.body.push(format!(
            "const {} = tx.makeMoveVec({{ {}elements: [{}] }});",
            name,
            type_field,
            exprs(&elems)
        ));
        self.record(
            CommandKind::MakeMoveVec,
            elem_type.map(str::to_string),
            Vec::new(),
            traces(&elems),
        );
        Ok(Emitted {
            expr: name,
            trace: TraceArg::Result { index },
        })
    }

    fn move_call(
        &mut self,
        target: CallTarget<'_>,
        args: Vec<Emitted>,
        out: &[String],
    ) -> Result<Vec<Emitted>, EncodeError> {
        let index = self.next_command()?;
        let mut call = String::new();
        let path = format!(
            "{}::{}::{}",
            target.package, target.module, target.function
        );
        let _ = write!(call, "tx.moveCall({{ target: {}", render::quoted(&path));
        if !target.type_args.is_empty() {
            let _ = write!(
                call,
                ", typeArguments: [{}]",
                target.type_args.iter().map(|t| render::quoted(t)).join(", ")
            );
        }
        let _ = write!(call, ", arguments: [{}] }})", exprs(&args));
        if out.is_empty() {
            self.body.push(format!("{};", call));
        } else {
            self.body
                .push(format!("const [{}] = {};", out.join(", "), call));
        }
        self.record(
            CommandKind::MoveCall,
            Some(format!(
                "{}::{}::{}",
                normalize_address(target.package),
                target.module,
                target.function
            )),
            target.type_args.to_vec(),
            traces(&args),
        );
        nested_results(index, out)
    }

    fn publish(
        &mut self,
        modules: &[String],
        dependencies: &[String],
        out: &str,
    ) -> Result<Emitted, EncodeError> {
        let index = self.next_command()?;
        self.body.push(format!(
            "const {} = tx.publish({{ modules: {}, dependencies: {} }});",
            out,
            render::string_array(modules),
            render::string_array(dependencies)
        ));
        self.record(CommandKind::Publish, None, Vec::new(), Vec::new());
        Ok(Emitted {
            expr: out.to_string(),
            trace: TraceArg::Result { index },
        })
    }

    fn upgrade(
        &mut self,
        modules: &[String],
        dependencies: &[String],
        package: &str,
        ticket: Emitted,
        out: &str,
    ) -> Result<Emitted, EncodeError> {
        let index = self.next_command()?;
        self.body.push(format!(
            "const {} = tx.upgrade({{ modules: {}, dependencies: {}, package: {}, ticket: {} }});",
            out,
            render::string_array(modules),
            render::string_array(dependencies),
            render::quoted(package),
            ticket.expr
        ));
        self.record(
            CommandKind::Upgrade,
            Some(normalize_address(package)),
            Vec::new(),
            vec![ticket.trace],
        );
        Ok(Emitted {
            expr: out.to_string(),
            trace: TraceArg::Result { index },
        })
    }

    fn finish(self, options: &ExecOptions) -> Result<EmittedSource, LowerError> {
        let mut code = String::new();
        code.push_str("import { Transaction } from '@mysten/sui/transactions';\n");
        if self.uses_hex {
            code.push_str("import { fromHex } from '@mysten/sui/utils';\n");
        }
        code.push('\n');
        if self.declares_sender {
            code.push_str("declare const myAddress: string;\n\n");
        }
        code.push_str("const tx = new Transaction();\n");
        if let Some(sender) = &options.sender {
            let sender = parse_address(sender)
                .map(|bytes| format_address(&bytes))
                .map_err(|_| LowerError::InvalidSender(sender.clone()))?;
            code.push_str(&format!("tx.setSender('{}');\n", sender));
        }
        if let Some(budget) = options.gas_budget {
            code.push_str(&format!("tx.setGasBudget({});\n", budget));
        }
        if !self.body.is_empty() {
            code.push('\n');
        }
        for line in &self.body {
            code.push_str(line);
            code.push('\n');
        }
        code.push_str("\nexport default tx;\n");
        Ok(EmittedSource {
            code,
            trace: self.trace,
        })
    }
}
