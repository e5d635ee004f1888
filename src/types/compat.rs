use super::{NumericWidth, PtbType, ScalarKind};

/// Decides whether a value of type `src` may be wired into a port of type `dst`.
///
/// Object type tags are advisory and never compared.
pub fn is_type_compatible(src: &PtbType, dst: &PtbType) -> bool {
    if src.is_wildcard() || dst.is_wildcard() {
        return true;
    }
    match (src, dst) {
        (
            PtbType::Scalar {
                scalar: ScalarKind::Number,
            },
            PtbType::MoveNumeric { .. },
        ) => true,
        (PtbType::Vector { elem: s }, PtbType::Vector { elem: d }) => is_type_compatible(s, d),
        (PtbType::Object { .. }, PtbType::Object { .. }) => true,
        (PtbType::Tuple { elems: s }, PtbType::Tuple { elems: d }) => {
            s.len() == d.len() && s.iter().zip(d).all(|(s, d)| is_type_compatible(s, d))
        }
        (s, d) => s == d,
    }
}

/// Returns the Move width a `number` must be cast to when wired into `dst`.
pub fn infer_cast_target(src: &PtbType, dst: &PtbType) -> Option<NumericWidth> {
    match (src, dst) {
        (
            PtbType::Scalar {
                scalar: ScalarKind::Number,
            },
            PtbType::MoveNumeric { width },
        ) => Some(*width),
        (PtbType::Vector { elem: s }, PtbType::Vector { elem: d }) => infer_cast_target(s, d),
        _ => None,
    }
}
