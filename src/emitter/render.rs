//! TypeScript spellings of pure values.

use crate::types::parse::ID_TAG;
use crate::types::{NumericWidth, PtbType, ScalarKind};
use itertools::Itertools;
use serde_json::Value;

/// A `tx.pure…` call producing the value `json` of Move type `ty`.
pub(super) fn pure_call(ty: &str, json: &Value) -> String {
    let parsed = PtbType::parse_move(ty);
    match &parsed {
        PtbType::Vector { elem } => match elem.as_ref() {
            PtbType::Vector { .. } => format!(
                "tx.pure({}, {})",
                quoted(&sdk_type(&parsed)),
                js_value(&parsed, json)
            ),
            _ => format!(
                "tx.pure.vector({}, {})",
                quoted(&sdk_type(elem)),
                js_value(&parsed, json)
            ),
        },
        _ => format!("tx.pure.{}({})", sdk_type(&parsed), js_value(&parsed, json)),
    }
}

/// The type name the SDK's pure helpers take.
fn sdk_type(ty: &PtbType) -> String {
    match ty {
        PtbType::Scalar { scalar } => match scalar {
            ScalarKind::Bool => "bool".to_string(),
            ScalarKind::String => "string".to_string(),
            ScalarKind::Address => "address".to_string(),
            ScalarKind::Number => "u64".to_string(),
        },
        PtbType::MoveNumeric { width } => width.to_string(),
        PtbType::Object { type_tag } if type_tag.as_deref() == Some(ID_TAG) => "id".to_string(),
        PtbType::Vector { elem } => format!("vector<{}>", sdk_type(elem)),
        other => other.to_string(),
    }
}

fn js_value(ty: &PtbType, json: &Value) -> String {
    match (ty, json) {
        (PtbType::MoveNumeric { width }, Value::String(n)) => match width {
            NumericWidth::U8 | NumericWidth::U16 | NumericWidth::U32 => n.clone(),
            _ => format!("{}n", n),
        },
        (PtbType::Vector { elem }, Value::Array(items)) => {
            format!("[{}]", items.iter().map(|i| js_value(elem, i)).join(", "))
        }
        (
            PtbType::Scalar {
                scalar: ScalarKind::Address,
            },
            Value::String(a),
        ) => quoted(a),
        (PtbType::Object { .. }, Value::String(id)) => quoted(id),
        (_, other) => other.to_string(),
    }
}

/// A single-quoted string literal. Quotes, backslashes and control
/// characters are escaped so the text cannot end the literal early.
pub(super) fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() || c == '\u{2028}' || c == '\u{2029}' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// A JSON-compatible array of string literals.
pub(super) fn string_array(items: &[String]) -> String {
    Value::Array(items.iter().cloned().map(Value::String).collect()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_calls() {
        assert_eq!(pure_call("u64", &json!("500")), "tx.pure.u64(500n)");
        assert_eq!(pure_call("u8", &json!("5")), "tx.pure.u8(5)");
        assert_eq!(pure_call("bool", &json!(true)), "tx.pure.bool(true)");
        assert_eq!(
            pure_call("0x1::string::String", &json!("hi \"there\"")),
            r#"tx.pure.string("hi \"there\"")"#
        );
        assert_eq!(pure_call(ID_TAG, &json!("0x01")), "tx.pure.id('0x01')");
    }

    #[test]
    fn quoting_escapes_the_delimiter() {
        assert_eq!(quoted("0x2::sui::SUI"), "'0x2::sui::SUI'");
        assert_eq!(quoted("a'b"), r"'a\'b'");
        assert_eq!(quoted("back\\slash"), r"'back\\slash'");
        assert_eq!(quoted("line\nbreak"), r"'line\nbreak'");
        assert_eq!(quoted("\u{0}"), r"'\u0000'");
    }

    #[test]
    fn vector_calls() {
        assert_eq!(
            pure_call("vector<u64>", &json!(["1", "2"])),
            "tx.pure.vector('u64', [1n, 2n])"
        );
        assert_eq!(
            pure_call("vector<vector<u8>>", &json!([["1"]])),
            "tx.pure('vector<vector<u8>>', [[1]])"
        );
    }
}
