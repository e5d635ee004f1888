pub mod compat;
pub mod parse;

pub use compat::*;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The UI-level scalar kinds a port can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarKind {
    Bool,
    String,
    Address,
    /// A width-less number entered in the editor. Castable to any Move width.
    Number,
}

/// Bit widths of Move's unsigned integer types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericWidth {
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
}

impl NumericWidth {
    pub const ALL: [NumericWidth; 6] = [
        NumericWidth::U8,
        NumericWidth::U16,
        NumericWidth::U32,
        NumericWidth::U64,
        NumericWidth::U128,
        NumericWidth::U256,
    ];

    pub fn bits(self) -> u32 {
        match self {
            NumericWidth::U8 => 8,
            NumericWidth::U16 => 16,
            NumericWidth::U32 => 32,
            NumericWidth::U64 => 64,
            NumericWidth::U128 => 128,
            NumericWidth::U256 => 256,
        }
    }

    /// Size of the little-endian wire encoding in bytes.
    pub fn byte_len(self) -> usize {
        (self.bits() / 8) as usize
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.bits() == bits)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NumericWidth::U8 => "u8",
            NumericWidth::U16 => "u16",
            NumericWidth::U32 => "u32",
            NumericWidth::U64 => "u64",
            NumericWidth::U128 => "u128",
            NumericWidth::U256 => "u256",
        }
    }
}

impl fmt::Display for NumericWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type descriptor attached to io ports and variables.
///
/// The type is a tree: `Vector` and `Tuple` own their children, so a type can
/// never refer back to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PtbType {
    Scalar {
        scalar: ScalarKind,
    },
    MoveNumeric {
        width: NumericWidth,
    },
    Object {
        #[serde(default, rename = "typeTag", skip_serializing_if = "Option::is_none")]
        type_tag: Option<String>,
    },
    Vector {
        elem: Box<PtbType>,
    },
    Tuple {
        elems: Vec<PtbType>,
    },
    TypeParam {
        name: String,
    },
    Unknown,
}

impl PtbType {
    pub fn bool() -> Self {
        PtbType::Scalar {
            scalar: ScalarKind::Bool,
        }
    }

    pub fn string() -> Self {
        PtbType::Scalar {
            scalar: ScalarKind::String,
        }
    }

    pub fn address() -> Self {
        PtbType::Scalar {
            scalar: ScalarKind::Address,
        }
    }

    pub fn number() -> Self {
        PtbType::Scalar {
            scalar: ScalarKind::Number,
        }
    }

    pub fn numeric(width: NumericWidth) -> Self {
        PtbType::MoveNumeric { width }
    }

    pub fn u64() -> Self {
        PtbType::numeric(NumericWidth::U64)
    }

    /// A generic object with no concrete type tag.
    pub fn object() -> Self {
        PtbType::Object { type_tag: None }
    }

    pub fn object_of(tag: impl Into<String>) -> Self {
        PtbType::Object {
            type_tag: Some(tag.into()),
        }
    }

    pub fn vector(elem: PtbType) -> Self {
        PtbType::Vector {
            elem: Box::new(elem),
        }
    }

    pub fn type_param(name: impl Into<String>) -> Self {
        PtbType::TypeParam { name: name.into() }
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, PtbType::Vector { .. })
    }

    pub fn is_object(&self) -> bool {
        matches!(self, PtbType::Object { .. })
    }

    /// `Unknown` and `TypeParam` match anything during wiring.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, PtbType::Unknown | PtbType::TypeParam { .. })
    }

    pub fn vector_elem(&self) -> Option<&PtbType> {
        match self {
            PtbType::Vector { elem } => Some(elem),
            _ => None,
        }
    }

    /// Renders the type the way Move spells it, for wire-level type arguments.
    /// Returns `None` when the type has no concrete Move spelling.
    pub fn to_move_type(&self) -> Option<String> {
        match self {
            PtbType::Scalar { scalar } => match scalar {
                ScalarKind::Bool => Some("bool".to_string()),
                ScalarKind::String => Some(parse::STRING_TAG.to_string()),
                ScalarKind::Address => Some("address".to_string()),
                ScalarKind::Number => Some("u64".to_string()),
            },
            PtbType::MoveNumeric { width } => Some(width.to_string()),
            PtbType::Object { type_tag } => type_tag.clone(),
            PtbType::Vector { elem } => elem.to_move_type().map(|e| format!("vector<{}>", e)),
            PtbType::Tuple { .. } | PtbType::TypeParam { .. } | PtbType::Unknown => None,
        }
    }
}

impl fmt::Display for PtbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PtbType::Scalar { scalar } => match scalar {
                ScalarKind::Bool => write!(f, "bool"),
                ScalarKind::String => write!(f, "string"),
                ScalarKind::Address => write!(f, "address"),
                ScalarKind::Number => write!(f, "number"),
            },
            PtbType::MoveNumeric { width } => write!(f, "{}", width),
            PtbType::Object { type_tag: None } => write!(f, "object"),
            PtbType::Object {
                type_tag: Some(tag),
            } => write!(f, "object<{}>", tag),
            PtbType::Vector { elem } => write!(f, "vector<{}>", elem),
            PtbType::Tuple { elems } => write!(f, "({})", elems.iter().join(", ")),
            PtbType::TypeParam { name } => write!(f, "{}", name),
            PtbType::Unknown => write!(f, "unknown"),
        }
    }
}
