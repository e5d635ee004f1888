use crate::types::PtbType;
use serde::{Deserialize, Serialize};

pub const FLOW_IN: &str = "prev";
pub const FLOW_OUT: &str = "next";
pub const VARIABLE_OUT: &str = "out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortRole {
    /// Sequences execution; carries no value.
    Flow,
    /// Carries a typed value.
    Io,
}

/// A connection point on a node. Ports are derived from node payloads and
/// regenerated on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub id: String,
    pub direction: PortDirection,
    pub role: PortRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<PtbType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Port {
    pub fn flow_in() -> Self {
        Self {
            id: FLOW_IN.to_string(),
            direction: PortDirection::In,
            role: PortRole::Flow,
            data_type: None,
            label: None,
        }
    }

    pub fn flow_out() -> Self {
        Self {
            id: FLOW_OUT.to_string(),
            direction: PortDirection::Out,
            role: PortRole::Flow,
            data_type: None,
            label: None,
        }
    }

    pub fn io_in(id: impl Into<String>, data_type: PtbType) -> Self {
        Self {
            id: id.into(),
            direction: PortDirection::In,
            role: PortRole::Io,
            data_type: Some(data_type),
            label: None,
        }
    }

    pub fn io_out(id: impl Into<String>, data_type: PtbType) -> Self {
        Self {
            id: id.into(),
            direction: PortDirection::Out,
            role: PortRole::Io,
            data_type: Some(data_type),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_io_in(&self) -> bool {
        self.role == PortRole::Io && self.direction == PortDirection::In
    }

    pub fn is_io_out(&self) -> bool {
        self.role == PortRole::Io && self.direction == PortDirection::Out
    }

    /// The declared type, or `Unknown` for untyped ports.
    pub fn type_or_unknown(&self) -> PtbType {
        self.data_type.clone().unwrap_or(PtbType::Unknown)
    }
}
