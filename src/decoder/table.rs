use crate::tx::TxArgument;
use crate::types::PtbType;
use ahash::AHashMap;

/// A transaction argument reference, as a lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Gas,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

impl From<TxArgument> for ValueKey {
    fn from(arg: TxArgument) -> Self {
        match arg {
            TxArgument::GasCoin => ValueKey::Gas,
            TxArgument::Input { index } => ValueKey::Input(index),
            TxArgument::Result { index } => ValueKey::Result(index),
            TxArgument::NestedResult {
                index,
                result_index,
            } => ValueKey::NestedResult(index, result_index),
        }
    }
}

/// The output port a reference resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Producer {
    pub node: String,
    pub port: String,
    pub data_type: PtbType,
}

/// Maps argument references to the graph ports producing them. Lives for
/// one decode call.
#[derive(Debug, Default)]
pub struct ValueTable {
    entries: AHashMap<ValueKey, Producer>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ValueKey, node: &str, port: &str, data_type: PtbType) {
        self.entries.insert(
            key,
            Producer {
                node: node.to_string(),
                port: port.to_string(),
                data_type,
            },
        );
    }

    /// Registers a command output under both `Result(c)` and
    /// `NestedResult(c, 0)` when it is the command's first result.
    pub fn insert_result(
        &mut self,
        command: u16,
        result: u16,
        node: &str,
        port: &str,
        data_type: PtbType,
    ) {
        if result == 0 {
            self.insert(ValueKey::Result(command), node, port, data_type.clone());
        }
        self.insert(ValueKey::NestedResult(command, result), node, port, data_type);
    }

    pub fn get(&self, arg: TxArgument) -> Option<&Producer> {
        self.entries.get(&ValueKey::from(arg))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
