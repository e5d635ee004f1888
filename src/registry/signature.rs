use crate::types::{PtbType, parse::is_tx_context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The declared shape of one Move function, as reported by a signature source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSignature {
    pub type_params: usize,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl FunctionSignature {
    /// Drops the trailing `TxContext` parameter the runtime injects on its own.
    pub fn without_tx_context(mut self) -> Self {
        if self.inputs.last().is_some_and(|t| is_tx_context(t)) {
            self.inputs.pop();
        }
        self
    }
}

/// All function signatures of one package, keyed by module then function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSignatures {
    pub modules: BTreeMap<String, BTreeMap<String, FunctionSignature>>,
}

impl PackageSignatures {
    pub fn function(&self, module: &str, function: &str) -> Option<&FunctionSignature> {
        self.modules.get(module)?.get(function)
    }

    pub fn insert(&mut self, module: &str, function: &str, signature: FunctionSignature) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(function.to_string(), signature.without_tx_context());
    }
}

/// UI parameters of a `moveCall` command node.
///
/// The three parallel arrays stay empty until a signature is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveCallParams {
    pub package: String,
    pub module: String,
    pub function: String,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub params: Vec<PtbType>,
    #[serde(default)]
    pub returns: Vec<PtbType>,
}

impl MoveCallParams {
    pub fn new(package: &str, module: &str, function: &str) -> Self {
        Self {
            package: package.to_string(),
            module: module.to_string(),
            function: function.to_string(),
            ..Default::default()
        }
    }

    /// Parses a `package::module::function` target string.
    pub fn from_target(target: &str) -> Option<Self> {
        let mut parts = target.trim().split("::");
        let (package, module, function) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || package.is_empty() || module.is_empty() || function.is_empty()
        {
            return None;
        }
        Some(Self::new(package, module, function))
    }

    pub fn target(&self) -> String {
        format!("{}::{}::{}", self.package, self.module, self.function)
    }

    pub fn apply_signature(&mut self, signature: &FunctionSignature) {
        let signature = signature.clone().without_tx_context();
        self.type_params = (0..signature.type_params).map(|i| format!("T{}", i)).collect();
        self.params = signature.inputs.iter().map(|t| PtbType::parse_move(t)).collect();
        self.returns = signature.outputs.iter().map(|t| PtbType::parse_move(t)).collect();
    }

    pub fn with_signature(mut self, signature: &FunctionSignature) -> Self {
        self.apply_signature(signature);
        self
    }
}

impl fmt::Display for MoveCallParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target())
    }
}
