use super::pure::PureValue;
use super::{Transaction, TxArgument, TxCommand, TxInput, format_address, parse_address};
use crate::error::EncodeError;
use ahash::AHashMap;

/// Assembles a [`Transaction`] through sequential mutating calls.
///
/// Inputs are appended in the order they are first requested. Object inputs
/// are deduplicated by id; pure inputs never are.
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    sender: Option<String>,
    gas_budget: Option<u64>,
    inputs: Vec<TxInput>,
    commands: Vec<TxCommand>,
    objects: AHashMap<String, u16>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sender(&mut self, sender: &str) -> Result<(), EncodeError> {
        self.sender = Some(format_address(&parse_address(sender)?));
        Ok(())
    }

    pub fn set_gas_budget(&mut self, budget: u64) {
        self.gas_budget = Some(budget);
    }

    pub fn gas(&self) -> TxArgument {
        TxArgument::GasCoin
    }

    pub fn pure(&mut self, value: PureValue) -> Result<TxArgument, EncodeError> {
        let index = index_of(self.inputs.len(), "inputs")?;
        self.inputs.push(TxInput::Pure {
            value_type: value.value_type,
            bytes: value.bytes,
        });
        Ok(TxArgument::Input { index })
    }

    pub fn object(&mut self, object_id: &str) -> Result<TxArgument, EncodeError> {
        let id = format_address(&parse_address(object_id)?);
        if let Some(index) = self.objects.get(&id) {
            return Ok(TxArgument::Input { index: *index });
        }
        let index = index_of(self.inputs.len(), "inputs")?;
        self.inputs.push(TxInput::Object {
            object_id: id.clone(),
        });
        self.objects.insert(id, index);
        Ok(TxArgument::Input { index })
    }

    fn push(&mut self, command: TxCommand) -> Result<u16, EncodeError> {
        let index = index_of(self.commands.len(), "commands")?;
        self.commands.push(command);
        Ok(index)
    }

    pub fn split_coins(
        &mut self,
        coin: TxArgument,
        amounts: Vec<TxArgument>,
    ) -> Result<Vec<TxArgument>, EncodeError> {
        let count = index_of(amounts.len(), "results per command")?;
        let index = self.push(TxCommand::SplitCoins { coin, amounts })?;
        Ok(nested_results(index, count))
    }

    pub fn merge_coins(
        &mut self,
        destination: TxArgument,
        sources: Vec<TxArgument>,
    ) -> Result<(), EncodeError> {
        self.push(TxCommand::MergeCoins {
            destination,
            sources,
        })?;
        Ok(())
    }

    pub fn transfer_objects(
        &mut self,
        objects: Vec<TxArgument>,
        address: TxArgument,
    ) -> Result<(), EncodeError> {
        self.push(TxCommand::TransferObjects { objects, address })?;
        Ok(())
    }

    pub fn make_move_vec(
        &mut self,
        type_arg: Option<String>,
        elements: Vec<TxArgument>,
    ) -> Result<TxArgument, EncodeError> {
        let index = self.push(TxCommand::MakeMoveVec { type_arg, elements })?;
        Ok(TxArgument::Result { index })
    }

    /// Appends a call and returns one nested result per declared return value.
    pub fn move_call(
        &mut self,
        package: &str,
        module: &str,
        function: &str,
        type_arguments: Vec<String>,
        arguments: Vec<TxArgument>,
        returns: usize,
    ) -> Result<Vec<TxArgument>, EncodeError> {
        let count = index_of(returns, "results per command")?;
        let index = self.push(TxCommand::MoveCall {
            package: package.to_string(),
            module: module.to_string(),
            function: function.to_string(),
            type_arguments,
            arguments,
        })?;
        Ok(nested_results(index, count))
    }

    pub fn publish(
        &mut self,
        modules: Vec<String>,
        dependencies: Vec<String>,
    ) -> Result<TxArgument, EncodeError> {
        let index = self.push(TxCommand::Publish {
            modules,
            dependencies,
        })?;
        Ok(TxArgument::Result { index })
    }

    pub fn upgrade(
        &mut self,
        modules: Vec<String>,
        dependencies: Vec<String>,
        package: &str,
        ticket: TxArgument,
    ) -> Result<TxArgument, EncodeError> {
        let index = self.push(TxCommand::Upgrade {
            modules,
            dependencies,
            package: package.to_string(),
            ticket,
        })?;
        Ok(TxArgument::Result { index })
    }

    pub fn build(self) -> Transaction {
        Transaction {
            sender: self.sender,
            gas_budget: self.gas_budget,
            inputs: self.inputs,
            commands: self.commands,
        }
    }
}

/// Argument indices are `u16` on the wire.
pub(crate) fn index_of(len: usize, what: &'static str) -> Result<u16, EncodeError> {
    u16::try_from(len).map_err(|_| EncodeError::TooMany {
        what,
        limit: usize::from(u16::MAX) + 1,
    })
}

fn nested_results(index: u16, count: u16) -> Vec<TxArgument> {
    (0..count)
        .map(|result_index| TxArgument::NestedResult {
            index,
            result_index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_are_deduplicated_by_normalized_id() {
        let mut tx = TransactionBuilder::new();
        let a = tx.object("0x6").unwrap();
        let b = tx
            .object("0x0000000000000000000000000000000000000000000000000000000000000006")
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(tx.build().inputs.len(), 1);
    }

    #[test]
    fn results_are_numbered_by_command() {
        let mut tx = TransactionBuilder::new();
        let coins = tx
            .split_coins(TxArgument::GasCoin, vec![TxArgument::Input { index: 0 }; 2])
            .unwrap();
        assert_eq!(
            coins[1],
            TxArgument::NestedResult {
                index: 0,
                result_index: 1
            }
        );
        let vec = tx.make_move_vec(None, coins).unwrap();
        assert_eq!(vec, TxArgument::Result { index: 1 });
    }

    #[test]
    fn input_indices_do_not_wrap() {
        let mut tx = TransactionBuilder::new();
        for _ in 0..=u16::MAX {
            tx.pure(PureValue {
                value_type: Some("bool".to_string()),
                bytes: vec![1],
            })
            .unwrap();
        }
        let overflow = tx.pure(PureValue {
            value_type: Some("bool".to_string()),
            bytes: vec![1],
        });
        assert_eq!(
            overflow,
            Err(EncodeError::TooMany {
                what: "inputs",
                limit: 65536
            })
        );
        assert!(matches!(
            tx.object("0x6"),
            Err(EncodeError::TooMany { what: "inputs", .. })
        ));
        assert_eq!(tx.build().inputs.len(), 65536);
    }

    #[test]
    fn command_indices_do_not_wrap() {
        let mut tx = TransactionBuilder::new();
        for _ in 0..=u16::MAX {
            tx.publish(Vec::new(), Vec::new()).unwrap();
        }
        assert!(matches!(
            tx.make_move_vec(None, Vec::new()),
            Err(EncodeError::TooMany { what: "commands", .. })
        ));
        assert_eq!(index_of(3, "commands"), Ok(3));
    }
}
