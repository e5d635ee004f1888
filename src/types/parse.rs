//! Conversion between Move type strings and `PtbType`.
//!
//! Signatures and on-chain pure inputs name their types in Move syntax
//! (`u64`, `vector<address>`, `0x2::coin::Coin<0x2::sui::SUI>`). Only the
//! shapes the editor distinguishes are recovered; any other struct tag becomes
//! an object carrying the tag verbatim.

use super::{NumericWidth, PtbType};

pub const STRING_TAG: &str = "0x1::string::String";
pub const ASCII_STRING_TAG: &str = "0x1::ascii::String";
pub const ID_TAG: &str = "0x2::object::ID";
pub const TX_CONTEXT_TAG: &str = "0x2::tx_context::TxContext";

impl PtbType {
    /// Parses a Move type string. Never fails: unrecognised input yields `Unknown`.
    pub fn parse_move(input: &str) -> PtbType {
        let ty = input.trim();
        let ty = strip_reference(ty);
        if ty.is_empty() {
            return PtbType::Unknown;
        }

        match ty.to_ascii_lowercase().as_str() {
            "bool" => return PtbType::bool(),
            "address" => return PtbType::address(),
            "signer" => return PtbType::Unknown,
            lower => {
                if let Some(width) = lower
                    .strip_prefix('u')
                    .and_then(|bits| bits.parse::<u32>().ok())
                    .and_then(NumericWidth::from_bits)
                {
                    return PtbType::numeric(width);
                }
            }
        }

        if let Some(inner) = strip_wrapper(ty, "vector") {
            return PtbType::vector(PtbType::parse_move(inner));
        }

        if ty.contains("::") {
            let normalized = normalize_tag(ty);
            if is_string_tag(&normalized) {
                return PtbType::string();
            }
            return PtbType::object_of(normalized);
        }

        if is_generic_name(ty) {
            return PtbType::type_param(ty);
        }
        PtbType::Unknown
    }
}

/// True when the tag names `0x2::tx_context::TxContext`, by value or reference.
pub fn is_tx_context(input: &str) -> bool {
    let base = strip_reference(input.trim());
    normalize_tag(base) == TX_CONTEXT_TAG
}

fn strip_reference(ty: &str) -> &str {
    if let Some(rest) = ty.strip_prefix("&mut ") {
        rest.trim()
    } else if let Some(rest) = ty.strip_prefix('&') {
        rest.trim()
    } else {
        ty
    }
}

fn strip_wrapper<'a>(ty: &'a str, wrapper: &str) -> Option<&'a str> {
    let lower = ty.to_ascii_lowercase();
    if lower.starts_with(wrapper)
        && ty[wrapper.len()..].trim_start().starts_with('<')
        && ty.ends_with('>')
    {
        let open = ty.find('<')?;
        Some(&ty[open + 1..ty.len() - 1])
    } else {
        None
    }
}

/// Shortens a leading zero-padded address (`0x0000…02::coin::Coin`) to the
/// short form Move tooling prints (`0x2::coin::Coin`).
fn normalize_tag(tag: &str) -> String {
    let tag: String = tag.chars().filter(|c| !c.is_whitespace()).collect();
    let Some((address, rest)) = tag.split_once("::") else {
        return tag;
    };
    let digits = address.trim_start_matches("0x").trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    format!("0x{}::{}", digits, rest)
}

fn is_string_tag(tag: &str) -> bool {
    tag == STRING_TAG || tag == ASCII_STRING_TAG
}

fn is_generic_name(ty: &str) -> bool {
    let mut chars = ty.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
