//! Human-readable listing of a [`Program`], used by the CLI and debug dumps.

use super::{ArgShape, MoveArg, ObjectArg, POp, PValue, Program, Scalar};
use itertools::Itertools;
use std::fmt;

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::String(s) => write!(f, "{:?}", s),
            Scalar::Address(a) => write!(f, "@{}", a),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::MyAddress => write!(f, "@myAddress"),
            Scalar::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
        }
    }
}

impl fmt::Display for ObjectArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectArg::Id(id) => write!(f, "object({})", id),
            ObjectArg::Gas => write!(f, "gas"),
            ObjectArg::System => write!(f, "system"),
            ObjectArg::Clock => write!(f, "clock"),
            ObjectArg::Random => write!(f, "random"),
        }
    }
}

impl fmt::Display for PValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PValue::Undef => write!(f, "undef"),
            PValue::Ref(name) => write!(f, "${}", name),
            PValue::Scalar(s) => write!(f, "{}", s),
            PValue::MoveNumeric { width, value } => write!(f, "{}{}", value, width),
            PValue::Object(o) => write!(f, "{}", o),
            PValue::Vector(items) => write!(f, "[{}]", items.iter().join(", ")),
        }
    }
}

impl fmt::Display for ArgShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgShape::Expanded(values) => write!(f, "({})", values.iter().join(", ")),
            ArgShape::Vector(value) => write!(f, "{}..", value),
        }
    }
}

impl fmt::Display for MoveArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.value, self.kind)
    }
}

fn bind(out: &[String]) -> String {
    if out.is_empty() {
        String::new()
    } else {
        format!("[{}] = ", out.iter().map(|o| format!("${}", o)).join(", "))
    }
}

impl fmt::Display for POp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            POp::SplitCoins { coin, amounts, out } => write!(
                f,
                "{}splitCoins {} ({})",
                bind(out),
                coin,
                amounts.iter().join(", ")
            ),
            POp::MergeCoins {
                destination,
                sources,
            } => write!(f, "mergeCoins {} <- {}", destination, sources),
            POp::TransferObjects { objects, recipient } => {
                write!(f, "transferObjects {} -> {}", objects, recipient)
            }
            POp::MakeMoveVec {
                elem_type,
                elems,
                out,
            } => write!(
                f,
                "${} = makeMoveVec<{}> {}",
                out,
                elem_type.as_deref().unwrap_or("object"),
                elems
            ),
            POp::MoveCall {
                package,
                module,
                function,
                type_args,
                args,
                out,
            } => {
                write!(f, "{}moveCall {}::{}::{}", bind(out), package, module, function)?;
                if !type_args.is_empty() {
                    write!(f, "<{}>", type_args.iter().join(", "))?;
                }
                write!(f, "({})", args.iter().join(", "))
            }
            POp::Publish {
                modules,
                dependencies,
                out,
            } => write!(
                f,
                "${} = publish {} modules, {} deps",
                out,
                modules.len(),
                dependencies.len()
            ),
            POp::Upgrade {
                package,
                ticket,
                out,
                modules,
                ..
            } => write!(
                f,
                "${} = upgrade {} with {} ({} modules)",
                out,
                package,
                ticket,
                modules.len()
            ),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- VARS ---")?;
        for var in &self.vars {
            writeln!(f, "${} = {}", var.name, var.init)?;
        }
        writeln!(f, "--- OPS ---")?;
        for (i, op) in self.ops.iter().enumerate() {
            writeln!(f, "{:04}: {}", i, op)?;
        }
        Ok(())
    }
}
