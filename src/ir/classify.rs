use crate::types::parse::{ID_TAG, STRING_TAG};
use crate::types::{NumericWidth, PtbType, ScalarKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire-encoding class of a call argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    Address,
    Bool,
    /// An object id passed by value (`0x2::object::ID`).
    Id,
    String,
    Numeric(NumericWidth),
    Vector(Box<ParamKind>),
    /// An object handle or command result, passed as-is.
    TxArg,
    /// No declared type to go by.
    Other,
}

impl ParamKind {
    /// Classifies a declared port type. The value flowing into the port is
    /// never consulted, so a literal and a symbol of the same declared type
    /// always lower identically.
    pub fn classify(ty: &PtbType) -> ParamKind {
        match ty {
            PtbType::Scalar { scalar } => match scalar {
                ScalarKind::Address => ParamKind::Address,
                ScalarKind::Bool => ParamKind::Bool,
                ScalarKind::String => ParamKind::String,
                ScalarKind::Number => ParamKind::Numeric(NumericWidth::U64),
            },
            PtbType::MoveNumeric { width } => ParamKind::Numeric(*width),
            PtbType::Object { type_tag } if type_tag.as_deref() == Some(ID_TAG) => ParamKind::Id,
            PtbType::Object { .. } => ParamKind::TxArg,
            PtbType::Vector { elem } => match ParamKind::classify(elem) {
                ParamKind::TxArg => ParamKind::TxArg,
                ParamKind::Other => ParamKind::Other,
                inner => ParamKind::Vector(Box::new(inner)),
            },
            PtbType::Tuple { .. } | PtbType::TypeParam { .. } | PtbType::Unknown => {
                ParamKind::Other
            }
        }
    }

    /// True when values of this kind are BCS-encoded into a pure input.
    pub fn is_pure(&self) -> bool {
        !matches!(self, ParamKind::TxArg | ParamKind::Other)
    }

    /// The Move type name recorded next to pure bytes.
    pub fn pure_type(&self) -> Option<String> {
        match self {
            ParamKind::Address => Some("address".to_string()),
            ParamKind::Bool => Some("bool".to_string()),
            ParamKind::Id => Some(ID_TAG.to_string()),
            ParamKind::String => Some(STRING_TAG.to_string()),
            ParamKind::Numeric(width) => Some(width.to_string()),
            ParamKind::Vector(inner) => inner.pure_type().map(|t| format!("vector<{}>", t)),
            ParamKind::TxArg | ParamKind::Other => None,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Address => write!(f, "address"),
            ParamKind::Bool => write!(f, "bool"),
            ParamKind::Id => write!(f, "id"),
            ParamKind::String => write!(f, "string"),
            ParamKind::Numeric(width) => write!(f, "{}", width),
            ParamKind::Vector(inner) => write!(f, "vector<{}>", inner),
            ParamKind::TxArg => write!(f, "txarg"),
            ParamKind::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_declared_type() {
        assert_eq!(ParamKind::classify(&PtbType::number()), ParamKind::Numeric(NumericWidth::U64));
        assert_eq!(ParamKind::classify(&PtbType::object_of(ID_TAG)), ParamKind::Id);
        assert_eq!(ParamKind::classify(&PtbType::object()), ParamKind::TxArg);
        assert_eq!(
            ParamKind::classify(&PtbType::vector(PtbType::object())),
            ParamKind::TxArg
        );
        assert_eq!(
            ParamKind::classify(&PtbType::vector(PtbType::address())),
            ParamKind::Vector(Box::new(ParamKind::Address))
        );
        assert_eq!(ParamKind::classify(&PtbType::type_param("T0")), ParamKind::Other);
        assert_eq!(
            ParamKind::classify(&PtbType::vector(PtbType::Unknown)),
            ParamKind::Other
        );
    }

    #[test]
    fn pure_type_names() {
        let kind = ParamKind::Vector(Box::new(ParamKind::Numeric(NumericWidth::U8)));
        assert_eq!(kind.pure_type().as_deref(), Some("vector<u8>"));
        assert_eq!(ParamKind::TxArg.pure_type(), None);
    }
}
