//! Literal conversion for variable nodes.

use crate::graph::VariableNode;
use crate::ir::{ObjectArg, PValue, Scalar};
use crate::tx::normalize_address;
use crate::types::parse::ID_TAG;
use crate::types::{PtbType, ScalarKind};
use serde_json::Value;
use tracing::warn;

pub const WALLET_SENTINELS: &[&str] = &["myaddress", "my_address", "sender", "wallet"];

const SYSTEM_STATE_TAG: &str = "0x3::sui_system::SuiSystemState";
const CLOCK_TAG: &str = "0x2::clock::Clock";
const RANDOM_TAG: &str = "0x2::random::Random";

/// What a variable contributes to the program.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Binding {
    /// Bound to a symbol in `Program::vars`.
    Symbol(PValue),
    /// Substituted directly at every use site.
    Inline(PValue),
}

pub(super) fn bind_variable(var: &VariableNode) -> Binding {
    match &var.var_type {
        PtbType::Object { type_tag } if type_tag.as_deref() != Some(ID_TAG) => {
            if let Some(special) = special_object(var, type_tag.as_deref()) {
                return Binding::Inline(PValue::Object(special));
            }
        }
        PtbType::Scalar {
            scalar: ScalarKind::Address,
        } if is_wallet_sentinel(var) => return Binding::Inline(PValue::Scalar(Scalar::MyAddress)),
        _ => {}
    }
    Binding::Symbol(match &var.value {
        Some(value) => convert(&var.var_type, value, &var.id),
        None => PValue::Undef,
    })
}

fn is_wallet_sentinel(var: &VariableNode) -> bool {
    let matches = |s: &str| WALLET_SENTINELS.contains(&s.trim().to_ascii_lowercase().as_str());
    matches(&var.name) || var.value.as_ref().and_then(Value::as_str).is_some_and(matches)
}

fn special_object(var: &VariableNode, type_tag: Option<&str>) -> Option<ObjectArg> {
    match var.value.as_ref().and_then(Value::as_str).map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("gas") => return Some(ObjectArg::Gas),
        Some(v) if !v.is_empty() => {
            let id = normalize_address(v);
            return [ObjectArg::System, ObjectArg::Clock, ObjectArg::Random]
                .into_iter()
                .find(|s| s.system_id().map(normalize_address).as_deref() == Some(id.as_str()));
        }
        _ => {}
    }
    match type_tag {
        Some(SYSTEM_STATE_TAG) => return Some(ObjectArg::System),
        Some(CLOCK_TAG) => return Some(ObjectArg::Clock),
        Some(RANDOM_TAG) => return Some(ObjectArg::Random),
        _ => {}
    }
    match var.name.trim().to_ascii_lowercase().as_str() {
        "gas" | "gas_coin" | "gascoin" => Some(ObjectArg::Gas),
        "clock" => Some(ObjectArg::Clock),
        "system" | "sui_system" => Some(ObjectArg::System),
        "random" => Some(ObjectArg::Random),
        _ => None,
    }
}

/// Converts a JSON literal to a value of the declared type. Malformed
/// literals are carried through as strings so that lowering reports them
/// against the operand that uses them.
fn convert(ty: &PtbType, value: &Value, node_id: &str) -> PValue {
    if value.is_null() {
        return PValue::Undef;
    }
    match ty {
        PtbType::Scalar { scalar } => match scalar {
            ScalarKind::Bool => match value {
                Value::Bool(b) => PValue::Scalar(Scalar::Bool(*b)),
                Value::String(s) if s.eq_ignore_ascii_case("true") => {
                    PValue::Scalar(Scalar::Bool(true))
                }
                Value::String(s) if s.eq_ignore_ascii_case("false") => {
                    PValue::Scalar(Scalar::Bool(false))
                }
                other => {
                    warn!(
                        node = node_id,
                        value = %other,
                        "bool variable holds a non-boolean literal"
                    );
                    PValue::Undef
                }
            },
            ScalarKind::String => PValue::Scalar(Scalar::String(text(value))),
            ScalarKind::Address => PValue::Scalar(Scalar::Address(text(value).trim().to_string())),
            ScalarKind::Number => PValue::Scalar(Scalar::Number(text(value).trim().to_string())),
        },
        PtbType::MoveNumeric { width } => PValue::MoveNumeric {
            width: *width,
            value: text(value).trim().to_string(),
        },
        // An `ID` is an address-shaped pure value, not an object handle.
        PtbType::Object {
            type_tag: Some(tag),
        } if tag == ID_TAG => PValue::Scalar(Scalar::Address(text(value).trim().to_string())),
        PtbType::Object { .. } => match value.as_str().map(str::trim) {
            Some(id) if !id.is_empty() => PValue::Object(ObjectArg::Id(id.to_string())),
            _ => {
                warn!(node = node_id, "object variable has no object id");
                PValue::Undef
            }
        },
        PtbType::Vector { elem } => match value {
            Value::Array(items) => {
                PValue::Vector(items.iter().map(|v| convert(elem, v, node_id)).collect())
            }
            other => {
                warn!(node = node_id, value = %other, "vector variable holds a non-array literal");
                PValue::Undef
            }
        },
        PtbType::Unknown => infer(value),
        PtbType::Tuple { .. } | PtbType::TypeParam { .. } => {
            warn!(node = node_id, ty = %ty, "variable type has no literal form");
            PValue::Undef
        }
    }
}

/// Untyped literals: hex strings are taken as already-encoded bytes.
fn infer(value: &Value) -> PValue {
    match value {
        Value::Bool(b) => PValue::Scalar(Scalar::Bool(*b)),
        Value::Number(n) => PValue::Scalar(Scalar::Number(n.to_string())),
        Value::String(s) => match s.strip_prefix("0x").map(hex::decode) {
            Some(Ok(bytes)) => PValue::Scalar(Scalar::Bytes(bytes)),
            _ => PValue::Scalar(Scalar::String(s.clone())),
        },
        Value::Array(items) => PValue::Vector(items.iter().map(infer).collect()),
        Value::Null | Value::Object(_) => PValue::Undef,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn var(name: &str, ty: PtbType, value: Option<Value>) -> VariableNode {
        VariableNode {
            id: "v".to_string(),
            name: name.to_string(),
            var_type: ty,
            value,
        }
    }

    #[test]
    fn special_objects_are_inlined() {
        assert_eq!(
            bind_variable(&var("gas", PtbType::object(), None)),
            Binding::Inline(PValue::Object(ObjectArg::Gas))
        );
        assert_eq!(
            bind_variable(&var("c", PtbType::object(), Some(json!("0x6")))),
            Binding::Inline(PValue::Object(ObjectArg::Clock))
        );
        assert_eq!(
            bind_variable(&var("s", PtbType::object_of(SYSTEM_STATE_TAG), None)),
            Binding::Inline(PValue::Object(ObjectArg::System))
        );
        assert_eq!(
            bind_variable(&var("clock", PtbType::object(), Some(json!("0xabc")))),
            Binding::Symbol(PValue::Object(ObjectArg::Id("0xabc".to_string())))
        );
    }

    #[test]
    fn wallet_sentinels() {
        assert_eq!(
            bind_variable(&var("myAddress", PtbType::address(), None)),
            Binding::Inline(PValue::Scalar(Scalar::MyAddress))
        );
        assert_eq!(
            bind_variable(&var("to", PtbType::address(), Some(json!("sender")))),
            Binding::Inline(PValue::Scalar(Scalar::MyAddress))
        );
    }

    #[test]
    fn literal_conversion() {
        assert_eq!(
            bind_variable(&var("n", PtbType::number(), Some(json!(500000000)))),
            Binding::Symbol(PValue::Scalar(Scalar::Number("500000000".to_string())))
        );
        assert_eq!(
            bind_variable(&var(
                "xs",
                PtbType::vector(PtbType::u64()),
                Some(json!(["1", 2]))
            )),
            Binding::Symbol(PValue::Vector(vec![
                PValue::MoveNumeric {
                    width: crate::types::NumericWidth::U64,
                    value: "1".to_string()
                },
                PValue::MoveNumeric {
                    width: crate::types::NumericWidth::U64,
                    value: "2".to_string()
                },
            ]))
        );
        assert_eq!(
            bind_variable(&var("raw", PtbType::Unknown, Some(json!("0x0102")))),
            Binding::Symbol(PValue::Scalar(Scalar::Bytes(vec![1, 2])))
        );
    }
}
