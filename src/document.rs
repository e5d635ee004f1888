//! The editor's save format.
//!
//! Ports are derived from node payloads and never stored, so a document holds
//! only what the user authored plus optional collaborator snapshots that let
//! it be reopened offline.

use crate::backend::ExecOptions;
use crate::collab::{ObjectSnapshot, SignatureSnapshot};
use crate::error::DocumentError;
use crate::graph::Graph;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Newest document version this crate reads and the one it writes.
pub const DOCUMENT_VERSION: u32 = 1;

/// Canvas viewport state. Opaque to the compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PtbDocument {
    pub version: u32,
    /// Chain identifier, e.g. `sui:testnet`.
    pub chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub graph: Graph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<Viewport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<SignatureSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<ObjectSnapshot>,
}

impl PtbDocument {
    pub fn new(chain: impl Into<String>, graph: Graph) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            chain: chain.into(),
            sender: None,
            graph,
            view: None,
            signatures: None,
            objects: None,
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Embeds signatures, dropping an empty snapshot.
    pub fn with_signatures(mut self, signatures: SignatureSnapshot) -> Self {
        self.signatures = (!signatures.is_empty()).then_some(signatures);
        self
    }

    pub fn with_objects(mut self, objects: ObjectSnapshot) -> Self {
        self.objects = (!objects.is_empty()).then_some(objects);
        self
    }

    /// Lowering options implied by the document.
    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            sender: self.sender.clone(),
            gas_budget: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: PtbDocument = serde_json::from_str(json)?;
        if document.version > DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
                supported: DOCUMENT_VERSION,
            });
        }
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| DocumentError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|e| DocumentError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
