//! Port generation for command nodes.
//!
//! Every command kind maps its UI parameters to a port list through
//! [`Command::ports`]. The mapping is a pure function of the parameters, so
//! regenerating ports after an edit yields the same ids and types for every
//! port that survived the edit.

pub mod signature;

pub use signature::*;

use crate::graph::Port;
use crate::types::PtbType;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const COIN_IN: &str = "in_coin";
pub const AMOUNT_IN: &str = "in_amount";
pub const COIN_OUT: &str = "out_coin";
pub const DESTINATION_IN: &str = "in_destination";
pub const SOURCE_IN: &str = "in_source";
pub const SOURCES_IN: &str = "in_sources";
pub const OBJECT_IN: &str = "in_object";
pub const OBJECTS_IN: &str = "in_objects";
pub const RECIPIENT_IN: &str = "in_recipient";
pub const ELEM_IN: &str = "in_elem";
pub const ELEMS_IN: &str = "in_elems";
pub const VECTOR_OUT: &str = "out_vector";
pub const TYPE_ARG_IN: &str = "in_targ";
pub const ARG_IN: &str = "in_arg";
pub const RETURN_OUT: &str = "out_ret";
pub const UPGRADE_CAP_OUT: &str = "out_upgrade_cap";
pub const TICKET_IN: &str = "in_ticket";
pub const RECEIPT_OUT: &str = "out_receipt";

pub const UPGRADE_CAP_TAG: &str = "0x2::package::UpgradeCap";
pub const UPGRADE_TICKET_TAG: &str = "0x2::package::UpgradeTicket";
pub const UPGRADE_RECEIPT_TAG: &str = "0x2::package::UpgradeReceipt";

/// Builds the id of the `index`-th port of an expanded group, e.g. `in_amount_0`.
pub fn indexed(prefix: &str, index: usize) -> String {
    format!("{}_{}", prefix, index)
}

/// Reads the index back out of an expanded port id.
pub fn port_index(port_id: &str, prefix: &str) -> Option<usize> {
    port_id
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .parse()
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    SplitCoins,
    MergeCoins,
    TransferObjects,
    MakeMoveVec,
    MoveCall,
    Publish,
    Upgrade,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::SplitCoins => "splitCoins",
            CommandKind::MergeCoins => "mergeCoins",
            CommandKind::TransferObjects => "transferObjects",
            CommandKind::MakeMoveVec => "makeMoveVec",
            CommandKind::MoveCall => "moveCall",
            CommandKind::Publish => "publish",
            CommandKind::Upgrade => "upgrade",
        };
        f.write_str(name)
    }
}

mod defaults {
    use crate::types::PtbType;

    pub fn two() -> usize {
        2
    }
    pub fn one() -> usize {
        1
    }
    pub fn expanded() -> bool {
        true
    }
    pub fn object() -> PtbType {
        PtbType::object()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishParams {
    /// Base64-encoded compiled modules.
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeParams {
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub package: String,
}

/// A command node's kind together with the UI parameters controlling its ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    SplitCoins {
        #[serde(default = "defaults::two")]
        amounts_count: usize,
    },
    MergeCoins {
        #[serde(default = "defaults::two")]
        sources_count: usize,
        #[serde(default = "defaults::expanded")]
        sources_expanded: bool,
    },
    TransferObjects {
        #[serde(default = "defaults::one")]
        objects_count: usize,
        #[serde(default = "defaults::expanded")]
        objects_expanded: bool,
    },
    MakeMoveVec {
        #[serde(default = "defaults::object")]
        elem_type: PtbType,
        #[serde(default = "defaults::two")]
        elems_count: usize,
        #[serde(default = "defaults::expanded")]
        elems_expanded: bool,
    },
    MoveCall(MoveCallParams),
    Publish(PublishParams),
    Upgrade(UpgradeParams),
}

impl Command {
    /// A command of the given kind with the editor's default parameters.
    pub fn new(kind: CommandKind) -> Self {
        match kind {
            CommandKind::SplitCoins => Command::SplitCoins {
                amounts_count: defaults::two(),
            },
            CommandKind::MergeCoins => Command::MergeCoins {
                sources_count: defaults::two(),
                sources_expanded: true,
            },
            CommandKind::TransferObjects => Command::TransferObjects {
                objects_count: defaults::one(),
                objects_expanded: true,
            },
            CommandKind::MakeMoveVec => Command::MakeMoveVec {
                elem_type: PtbType::object(),
                elems_count: defaults::two(),
                elems_expanded: true,
            },
            CommandKind::MoveCall => Command::MoveCall(MoveCallParams::default()),
            CommandKind::Publish => Command::Publish(PublishParams::default()),
            CommandKind::Upgrade => Command::Upgrade(UpgradeParams::default()),
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::SplitCoins { .. } => CommandKind::SplitCoins,
            Command::MergeCoins { .. } => CommandKind::MergeCoins,
            Command::TransferObjects { .. } => CommandKind::TransferObjects,
            Command::MakeMoveVec { .. } => CommandKind::MakeMoveVec,
            Command::MoveCall(_) => CommandKind::MoveCall,
            Command::Publish(_) => CommandKind::Publish,
            Command::Upgrade(_) => CommandKind::Upgrade,
        }
    }

    /// Whether the variable-length input group is rendered as one port per element.
    ///
    /// `splitCoins` is always expanded. A `makeMoveVec` over vectors can never be.
    pub fn is_expanded(&self) -> bool {
        match self {
            Command::SplitCoins { .. } => true,
            Command::MergeCoins {
                sources_expanded, ..
            } => *sources_expanded,
            Command::TransferObjects {
                objects_expanded, ..
            } => *objects_expanded,
            Command::MakeMoveVec {
                elem_type,
                elems_expanded,
                ..
            } => *elems_expanded && !elem_type.is_vector(),
            Command::MoveCall(_) | Command::Publish(_) | Command::Upgrade(_) => false,
        }
    }

    /// Full port list: flow ports first, then io inputs, then io outputs.
    pub fn ports(&self) -> Vec<Port> {
        let mut ports = vec![Port::flow_in(), Port::flow_out()];
        ports.extend(self.io_ports());
        ports
    }

    fn io_ports(&self) -> Vec<Port> {
        let expanded = self.is_expanded();
        match self {
            Command::SplitCoins { amounts_count } => {
                let n = (*amounts_count).max(1);
                let mut ports = vec![Port::io_in(COIN_IN, PtbType::object())];
                ports.extend((0..n).map(|i| Port::io_in(indexed(AMOUNT_IN, i), PtbType::u64())));
                ports.extend((0..n).map(|i| Port::io_out(indexed(COIN_OUT, i), PtbType::object())));
                ports
            }
            Command::MergeCoins { sources_count, .. } => {
                let mut ports = vec![Port::io_in(DESTINATION_IN, PtbType::object())];
                ports.extend(group_ports(
                    expanded,
                    SOURCE_IN,
                    SOURCES_IN,
                    (*sources_count).max(1),
                    &PtbType::object(),
                ));
                ports
            }
            Command::TransferObjects { objects_count, .. } => {
                let mut ports = group_ports(
                    expanded,
                    OBJECT_IN,
                    OBJECTS_IN,
                    (*objects_count).max(1),
                    &PtbType::object(),
                );
                ports.push(Port::io_in(RECIPIENT_IN, PtbType::address()));
                ports
            }
            Command::MakeMoveVec {
                elem_type,
                elems_count,
                ..
            } => {
                let mut ports = group_ports(expanded, ELEM_IN, ELEMS_IN, *elems_count, elem_type);
                ports.push(Port::io_out(VECTOR_OUT, PtbType::vector(elem_type.clone())));
                ports
            }
            Command::MoveCall(call) => {
                let type_args = call.type_params.iter().enumerate().map(|(i, name)| {
                    Port::io_in(indexed(TYPE_ARG_IN, i), PtbType::string()).with_label(name.clone())
                });
                let args = call
                    .params
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| Port::io_in(indexed(ARG_IN, i), ty.clone()));
                let returns = call
                    .returns
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| Port::io_out(indexed(RETURN_OUT, i), ty.clone()));
                type_args.chain(args).chain(returns).collect()
            }
            Command::Publish(_) => vec![Port::io_out(
                UPGRADE_CAP_OUT,
                PtbType::object_of(UPGRADE_CAP_TAG),
            )],
            Command::Upgrade(_) => vec![
                Port::io_in(TICKET_IN, PtbType::object_of(UPGRADE_TICKET_TAG)),
                Port::io_out(RECEIPT_OUT, PtbType::object_of(UPGRADE_RECEIPT_TAG)),
            ],
        }
    }
}

fn group_ports(
    expanded: bool,
    scalar_prefix: &str,
    vector_id: &str,
    count: usize,
    elem: &PtbType,
) -> Vec<Port> {
    if expanded {
        (0..count)
            .map(|i| Port::io_in(indexed(scalar_prefix, i), elem.clone()))
            .collect()
    } else {
        vec![Port::io_in(vector_id, PtbType::vector(elem.clone()))]
    }
}
