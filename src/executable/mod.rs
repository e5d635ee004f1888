//! Lowering into a live [`Transaction`].

use crate::backend::{
    CallTarget, CallTrace, ExecOptions, Literal, LoweringBackend, TraceArg, TracedCall, lower,
};
use crate::error::{EncodeError, LowerError};
use crate::ir::{ObjectArg, ParamKind, Program};
use crate::registry::CommandKind;
use crate::tx::pure::{self, canonical};
use crate::tx::{
    Transaction, TransactionBuilder, TxArgument, TxCommand, TxInput, normalize_address,
};

/// Drives a [`TransactionBuilder`] from a program.
#[derive(Debug, Default)]
pub struct ExecutableBuilder {
    tx: TransactionBuilder,
}

impl ExecutableBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Lowers `program` into a transaction ready for signing.
pub fn build_transaction(
    program: &Program,
    options: &ExecOptions,
) -> Result<Transaction, LowerError> {
    lower(program, ExecutableBuilder::new(), options)
}

impl LoweringBackend for ExecutableBuilder {
    type Handle = TxArgument;
    type Output = Transaction;

    fn requires_sender(&self) -> bool {
        true
    }

    fn object(
        &mut self,
        object: &ObjectArg,
        _symbol: Option<&str>,
    ) -> Result<TxArgument, EncodeError> {
        match object {
            ObjectArg::Gas => Ok(self.tx.gas()),
            ObjectArg::Id(id) => self.tx.object(id),
            special => match special.system_id() {
                Some(id) => self.tx.object(id),
                None => Ok(self.tx.gas()),
            },
        }
    }

    fn pure(
        &mut self,
        kind: &ParamKind,
        value: &Literal,
        _symbol: Option<&str>,
    ) -> Result<TxArgument, EncodeError> {
        let encoded = pure::encode(kind, value)?;
        self.tx.pure(encoded)
    }

    fn split_coins(
        &mut self,
        coin: TxArgument,
        amounts: Vec<TxArgument>,
        _out: &[String],
    ) -> Result<Vec<TxArgument>, EncodeError> {
        self.tx.split_coins(coin, amounts)
    }

    fn merge_coins(
        &mut self,
        destination: TxArgument,
        sources: Vec<TxArgument>,
    ) -> Result<(), EncodeError> {
        self.tx.merge_coins(destination, sources)
    }

    fn transfer_objects(
        &mut self,
        objects: Vec<TxArgument>,
        recipient: TxArgument,
    ) -> Result<(), EncodeError> {
        self.tx.transfer_objects(objects, recipient)
    }

    fn make_move_vec(
        &mut self,
        elem_type: Option<&str>,
        elems: Vec<TxArgument>,
        _out: Option<&str>,
    ) -> Result<TxArgument, EncodeError> {
        self.tx.make_move_vec(elem_type.map(str::to_string), elems)
    }

    fn move_call(
        &mut self,
        target: CallTarget<'_>,
        args: Vec<TxArgument>,
        out: &[String],
    ) -> Result<Vec<TxArgument>, EncodeError> {
        self.tx.move_call(
            target.package,
            target.module,
            target.function,
            target.type_args.to_vec(),
            args,
            out.len(),
        )
    }

    fn publish(
        &mut self,
        modules: &[String],
        dependencies: &[String],
        _out: &str,
    ) -> Result<TxArgument, EncodeError> {
        self.tx.publish(modules.to_vec(), dependencies.to_vec())
    }

    fn upgrade(
        &mut self,
        modules: &[String],
        dependencies: &[String],
        package: &str,
        ticket: TxArgument,
        _out: &str,
    ) -> Result<TxArgument, EncodeError> {
        self.tx.upgrade(modules.to_vec(), dependencies.to_vec(), package, ticket)
    }

    fn finish(mut self, options: &ExecOptions) -> Result<Transaction, LowerError> {
        if let Some(sender) = &options.sender {
            self.tx
                .set_sender(sender)
                .map_err(|_| LowerError::InvalidSender(sender.clone()))?;
        }
        if let Some(budget) = options.gas_budget {
            self.tx.set_gas_budget(budget);
        }
        Ok(self.tx.build())
    }
}

impl Transaction {
    /// The calls this transaction issues, with every argument resolved to
    /// its canonical value. Commands without a modelled kind are skipped.
    pub fn call_trace(&self) -> CallTrace {
        let arg = |a: &TxArgument| match *a {
            TxArgument::GasCoin => TraceArg::Gas,
            TxArgument::Result { index } => TraceArg::Result { index },
            TxArgument::NestedResult {
                index,
                result_index,
            } => TraceArg::NestedResult {
                index,
                result: result_index,
            },
            TxArgument::Input { index } => match self.inputs.get(index as usize) {
                Some(TxInput::Pure { value_type, bytes }) => TraceArg::Pure {
                    value_type: value_type.clone(),
                    value: canonical(value_type.as_deref(), bytes),
                },
                Some(TxInput::Object { object_id }) => TraceArg::Object {
                    id: normalize_address(object_id),
                },
                None => TraceArg::Pure {
                    value_type: None,
                    value: serde_json::Value::Null,
                },
            },
        };

        self.commands
            .iter()
            .filter_map(|command| {
                let (kind, target, type_args) = match command {
                    TxCommand::SplitCoins { .. } => (CommandKind::SplitCoins, None, Vec::new()),
                    TxCommand::MergeCoins { .. } => (CommandKind::MergeCoins, None, Vec::new()),
                    TxCommand::TransferObjects { .. } => {
                        (CommandKind::TransferObjects, None, Vec::new())
                    }
                    TxCommand::MakeMoveVec { type_arg, .. } => {
                        (CommandKind::MakeMoveVec, type_arg.clone(), Vec::new())
                    }
                    TxCommand::MoveCall {
                        package,
                        module,
                        function,
                        type_arguments,
                        ..
                    } => (
                        CommandKind::MoveCall,
                        Some(format!("{}::{}::{}", normalize_address(package), module, function)),
                        type_arguments.clone(),
                    ),
                    TxCommand::Publish { .. } => (CommandKind::Publish, None, Vec::new()),
                    TxCommand::Upgrade { package, .. } => {
                        (CommandKind::Upgrade, Some(normalize_address(package)), Vec::new())
                    }
                    TxCommand::Unsupported => return None,
                };
                Some(TracedCall {
                    kind,
                    target,
                    type_args,
                    args: command.arguments().iter().map(arg).collect(),
                })
            })
            .collect()
    }
}
