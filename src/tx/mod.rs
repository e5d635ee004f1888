//! Linear programmable-transaction model: the executable builder's output
//! and the decoder's input.

pub mod builder;
pub mod pure;

pub use builder::TransactionBuilder;
pub(crate) use builder::index_of;

use crate::error::EncodeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_budget: Option<u64>,
    #[serde(default)]
    pub inputs: Vec<TxInput>,
    #[serde(default)]
    pub commands: Vec<TxCommand>,
}

impl Transaction {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A declared transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TxInput {
    /// BCS-encoded value. `value_type` is the Move type the bytes were encoded
    /// as, when the producer recorded it.
    Pure {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_type: Option<String>,
        #[serde(with = "base64_bytes")]
        bytes: Vec<u8>,
    },
    Object { object_id: String },
}

/// Argument reference in a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TxArgument {
    GasCoin,
    Input { index: u16 },
    Result { index: u16 },
    NestedResult { index: u16, result_index: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TxCommand {
    MoveCall {
        package: String,
        module: String,
        function: String,
        #[serde(default)]
        type_arguments: Vec<String>,
        #[serde(default)]
        arguments: Vec<TxArgument>,
    },
    SplitCoins {
        coin: TxArgument,
        amounts: Vec<TxArgument>,
    },
    MergeCoins {
        destination: TxArgument,
        sources: Vec<TxArgument>,
    },
    TransferObjects {
        objects: Vec<TxArgument>,
        address: TxArgument,
    },
    MakeMoveVec {
        #[serde(default)]
        type_arg: Option<String>,
        elements: Vec<TxArgument>,
    },
    Publish {
        /// Base64-encoded compiled modules.
        modules: Vec<String>,
        #[serde(default)]
        dependencies: Vec<String>,
    },
    Upgrade {
        modules: Vec<String>,
        #[serde(default)]
        dependencies: Vec<String>,
        package: String,
        ticket: TxArgument,
    },
    /// Any command kind this crate does not model.
    #[serde(other)]
    Unsupported,
}

impl TxCommand {
    pub fn name(&self) -> &'static str {
        match self {
            TxCommand::MoveCall { .. } => "MoveCall",
            TxCommand::SplitCoins { .. } => "SplitCoins",
            TxCommand::MergeCoins { .. } => "MergeCoins",
            TxCommand::TransferObjects { .. } => "TransferObjects",
            TxCommand::MakeMoveVec { .. } => "MakeMoveVec",
            TxCommand::Publish { .. } => "Publish",
            TxCommand::Upgrade { .. } => "Upgrade",
            TxCommand::Unsupported => "Unsupported",
        }
    }

    /// Every argument the command reads, in order.
    pub fn arguments(&self) -> Vec<TxArgument> {
        match self {
            TxCommand::MoveCall { arguments, .. } => arguments.clone(),
            TxCommand::SplitCoins { coin, amounts } => {
                std::iter::once(*coin).chain(amounts.iter().copied()).collect()
            }
            TxCommand::MergeCoins {
                destination,
                sources,
            } => std::iter::once(*destination)
                .chain(sources.iter().copied())
                .collect(),
            TxCommand::TransferObjects { objects, address } => objects
                .iter()
                .copied()
                .chain(std::iter::once(*address))
                .collect(),
            TxCommand::MakeMoveVec { elements, .. } => elements.clone(),
            TxCommand::Upgrade { ticket, .. } => vec![*ticket],
            TxCommand::Publish { .. } | TxCommand::Unsupported => Vec::new(),
        }
    }
}

/// Normalizes an address to lowercase `0x` plus 64 hex digits.
///
/// Lenient: the input is not checked for hex digits. Use [`parse_address`]
/// where invalid input must be rejected.
pub fn normalize_address(addr: &str) -> String {
    let addr = addr.trim();
    let hex = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr)
        .to_lowercase();
    if hex.len() < 64 {
        format!("0x{:0>64}", hex)
    } else {
        format!("0x{}", &hex[..64])
    }
}

/// Parses a short or full hex address into its 32 bytes.
pub fn parse_address(addr: &str) -> Result<[u8; 32], EncodeError> {
    let trimmed = addr.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || digits.len() > 64 {
        return Err(EncodeError::InvalidAddress(addr.to_string()));
    }
    let padded = format!("{:0>64}", digits);
    let mut out = [0u8; 32];
    hex::decode_to_slice(&padded, &mut out)
        .map_err(|_| EncodeError::InvalidAddress(addr.to_string()))?;
    Ok(out)
}

pub fn format_address(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_normalize_and_parse() {
        assert_eq!(
            normalize_address("0x2"),
            "0x0000000000000000000000000000000000000000000000000000000000000002"
        );
        let bytes = parse_address("0xAB").unwrap();
        assert_eq!(bytes[31], 0xab);
        assert!(parse_address("0xzz").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn unknown_commands_deserialize_as_unsupported() {
        let json = r#"{"inputs":[],"commands":[{"type":"Receive","foo":1}]}"#;
        let tx = Transaction::from_json(json).unwrap();
        assert_eq!(tx.commands, vec![TxCommand::Unsupported]);
    }

    #[test]
    fn pure_bytes_are_base64() {
        let input = TxInput::Pure {
            value_type: Some("u8".to_string()),
            bytes: vec![7],
        };
        let json = serde_json::to_string(&input).unwrap();
        assert_eq!(json, r#"{"type":"Pure","value_type":"u8","bytes":"Bw=="}"#);
    }
}
