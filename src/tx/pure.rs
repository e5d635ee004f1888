//! BCS encoding of pure values, and the canonical JSON form used by the
//! decoder and by call traces.

use super::{format_address, parse_address};
use crate::backend::Literal;
use crate::error::EncodeError;
use crate::ir::ParamKind;
use crate::types::parse::ID_TAG;
use crate::types::{NumericWidth, PtbType, ScalarKind};
use serde_json::Value;

/// Encoded pure bytes together with the Move type they were encoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PureValue {
    pub value_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Encodes `value` as a pure argument of kind `kind`.
///
/// `Other` positions have no declared type; the literal's own shape decides.
pub fn encode(kind: &ParamKind, value: &Literal) -> Result<PureValue, EncodeError> {
    if let Literal::Bytes(bytes) = value {
        return Ok(PureValue {
            value_type: kind.pure_type(),
            bytes: bytes.clone(),
        });
    }
    let kind = match kind {
        ParamKind::Other => infer_kind(value)?,
        other => other.clone(),
    };
    let mut bytes = Vec::new();
    encode_into(&kind, value, &mut bytes)?;
    Ok(PureValue {
        value_type: kind.pure_type(),
        bytes,
    })
}

fn infer_kind(value: &Literal) -> Result<ParamKind, EncodeError> {
    Ok(match value {
        Literal::Bool(_) => ParamKind::Bool,
        Literal::String(_) => ParamKind::String,
        Literal::Address(_) | Literal::Sender => ParamKind::Address,
        Literal::Number(_) => ParamKind::Numeric(NumericWidth::U64),
        Literal::Numeric(width, _) => ParamKind::Numeric(*width),
        Literal::List(items) => match items.first() {
            Some(first) => ParamKind::Vector(Box::new(infer_kind(first)?)),
            None => {
                return Err(EncodeError::Unencodable(
                    "an empty vector of unknown element type".to_string(),
                ));
            }
        },
        Literal::Bytes(_) => ParamKind::Other,
    })
}

fn mismatch(kind: &ParamKind, value: &Literal) -> EncodeError {
    EncodeError::KindMismatch {
        kind: kind.to_string(),
        value: format!("{:?}", value),
    }
}

fn encode_into(kind: &ParamKind, value: &Literal, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let bcs_error = |e: bcs::Error| EncodeError::Unencodable(e.to_string());
    match (kind, value) {
        (_, Literal::Bytes(bytes)) => out.extend_from_slice(bytes),
        (ParamKind::Bool, Literal::Bool(b)) => out.extend(bcs::to_bytes(b).map_err(bcs_error)?),
        (ParamKind::String, Literal::String(s)) => {
            out.extend(bcs::to_bytes(s).map_err(bcs_error)?)
        }
        (ParamKind::Address | ParamKind::Id, Literal::Address(a) | Literal::String(a)) => {
            out.extend_from_slice(&parse_address(a)?)
        }
        (ParamKind::Numeric(width), Literal::Number(n) | Literal::Numeric(_, n)) => {
            out.extend(encode_number(*width, n)?)
        }
        (ParamKind::Vector(inner), Literal::List(items)) => {
            out.extend(encode_uleb128(items.len()));
            for item in items {
                encode_into(inner, item, out)?;
            }
        }
        (ParamKind::TxArg | ParamKind::Other, _) => {
            return Err(EncodeError::Unencodable(kind.to_string()));
        }
        (kind, value) => return Err(mismatch(kind, value)),
    }
    Ok(())
}

/// Little-endian bytes of a decimal number at the given width.
fn encode_number(width: NumericWidth, text: &str) -> Result<Vec<u8>, EncodeError> {
    let invalid = || EncodeError::InvalidNumber {
        value: text.to_string(),
        width: width.to_string(),
    };
    let digits = text.trim().replace('_', "");
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if width == NumericWidth::U256 {
        return decimal_to_le(&digits, 32).ok_or_else(invalid);
    }
    let value: u128 = digits.parse().map_err(|_| invalid())?;
    if width.bits() < 128 && value >> width.bits() != 0 {
        return Err(invalid());
    }
    Ok(value.to_le_bytes()[..width.byte_len()].to_vec())
}

/// Schoolbook base-10 to base-256 conversion into a fixed little-endian buffer.
fn decimal_to_le(digits: &str, len: usize) -> Option<Vec<u8>> {
    let mut out = vec![0u8; len];
    for d in digits.bytes() {
        let mut carry = (d - b'0') as u32;
        for byte in out.iter_mut() {
            let v = *byte as u32 * 10 + carry;
            *byte = (v & 0xff) as u8;
            carry = v >> 8;
        }
        if carry != 0 {
            return None;
        }
    }
    Some(out)
}

fn le_to_decimal(bytes: &[u8]) -> String {
    let mut digits: Vec<u8> = vec![0];
    for byte in bytes.iter().rev() {
        let mut carry = *byte as u32;
        for d in digits.iter_mut() {
            let v = *d as u32 * 256 + carry;
            *d = (v % 10) as u8;
            carry = v / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }
    digits.iter().rev().map(|d| (b'0' + d) as char).collect()
}

pub fn encode_uleb128(mut value: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            bytes.push(byte);
            break;
        } else {
            bytes.push(byte | 0x80);
        }
    }
    bytes
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], EncodeError> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| EncodeError::Truncated(what.to_string()))?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn uleb128(&mut self) -> Result<usize, EncodeError> {
        let mut result: usize = 0;
        let mut shift = 0;
        loop {
            let byte = self.take(1, "a length prefix")?[0];
            if shift >= usize::BITS {
                return Err(EncodeError::Malformed {
                    ty: "vector".to_string(),
                    message: "length prefix overflows".to_string(),
                });
            }
            result |= ((byte & 0x7f) as usize) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
    }
}

/// Decodes pure bytes of the given Move type into canonical JSON: numbers as
/// decimal strings, addresses and ids as full hex, strings as text.
pub fn decode(value_type: &str, bytes: &[u8]) -> Result<Value, EncodeError> {
    let ty = PtbType::parse_move(value_type);
    let mut reader = Reader { bytes, offset: 0 };
    let value = decode_value(&ty, value_type, &mut reader)?;
    match bytes.len() - reader.offset {
        0 => Ok(value),
        rest => Err(EncodeError::TrailingBytes(rest)),
    }
}

fn decode_value(
    ty: &PtbType,
    spelled: &str,
    reader: &mut Reader<'_>,
) -> Result<Value, EncodeError> {
    let malformed = |message: &str| EncodeError::Malformed {
        ty: spelled.to_string(),
        message: message.to_string(),
    };
    match ty {
        PtbType::Scalar {
            scalar: ScalarKind::Bool,
        } => match reader.take(1, "bool")?[0] {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            _ => Err(malformed("bool byte is neither 0 nor 1")),
        },
        PtbType::Scalar {
            scalar: ScalarKind::Address,
        } => address_value(reader),
        PtbType::Scalar {
            scalar: ScalarKind::String,
        } => {
            let start = reader.offset;
            let len = reader.uleb128()?;
            reader.take(len, "string")?;
            let encoded = &reader.bytes[start..reader.offset];
            bcs::from_bytes::<String>(encoded)
                .map(Value::String)
                .map_err(|e| malformed(&e.to_string()))
        }
        PtbType::MoveNumeric { width } => {
            let raw = reader.take(width.byte_len(), width.as_str())?;
            Ok(Value::String(le_to_decimal(raw)))
        }
        PtbType::Object {
            type_tag: Some(tag),
        } if tag == ID_TAG => address_value(reader),
        PtbType::Vector { elem } => {
            let len = reader.uleb128()?;
            if len > reader.bytes.len() {
                return Err(malformed("vector length exceeds the input"));
            }
            let inner = elem.to_move_type().unwrap_or_default();
            (0..len)
                .map(|_| decode_value(elem, &inner, reader))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        _ => Err(EncodeError::Unencodable(spelled.to_string())),
    }
}

fn address_value(reader: &mut Reader<'_>) -> Result<Value, EncodeError> {
    let raw = reader.take(32, "address")?;
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(raw);
    Ok(Value::String(format_address(&bytes)))
}

/// Canonical JSON for pure bytes, falling back to a hex string when the type
/// is missing or the bytes do not decode.
pub fn canonical(value_type: Option<&str>, bytes: &[u8]) -> Value {
    value_type
        .and_then(|ty| decode(ty, bytes).ok())
        .unwrap_or_else(|| Value::String(format!("0x{}", hex::encode(bytes))))
}
