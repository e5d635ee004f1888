//! Interfaces to the outside world: call signatures and object metadata.
//!
//! The core only ever calls these synchronously. Implementations backed by a
//! network fetch are expected to have the data ready, or fail with
//! [`CollaboratorError::Unavailable`] so the caller can retry on its own terms.

use crate::error::CollaboratorError;
use crate::registry::PackageSignatures;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source of Move function signatures, one package at a time.
pub trait SignatureProvider {
    fn package(&self, package_id: &str) -> Result<PackageSignatures, CollaboratorError>;
}

/// Source of on-chain object type tags.
pub trait ObjectMetadataProvider {
    fn object_type(&self, object_id: &str) -> Result<String, CollaboratorError>;
}

/// Signatures held in memory, e.g. embedded in a saved document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureSnapshot {
    packages: BTreeMap<String, PackageSignatures>,
}

impl SignatureSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package_id: &str, signatures: PackageSignatures) {
        self.packages.insert(normalize_id(package_id), signatures);
    }

    pub fn with_package(mut self, package_id: &str, signatures: PackageSignatures) -> Self {
        self.insert(package_id, signatures);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl SignatureProvider for SignatureSnapshot {
    fn package(&self, package_id: &str) -> Result<PackageSignatures, CollaboratorError> {
        self.packages
            .get(&normalize_id(package_id))
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound {
                what: "package",
                key: package_id.to_string(),
            })
    }
}

/// Object type tags held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectSnapshot {
    types: AHashMap<String, String>,
}

impl ObjectSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object_id: &str, type_tag: impl Into<String>) {
        self.types.insert(normalize_id(object_id), type_tag.into());
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ObjectMetadataProvider for ObjectSnapshot {
    fn object_type(&self, object_id: &str) -> Result<String, CollaboratorError> {
        self.types
            .get(&normalize_id(object_id))
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound {
                what: "object",
                key: object_id.to_string(),
            })
    }
}

/// A provider that knows nothing. Decoding against it falls back to
/// signature-less port sizing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignatures;

impl SignatureProvider for NoSignatures {
    fn package(&self, package_id: &str) -> Result<PackageSignatures, CollaboratorError> {
        Err(CollaboratorError::NotFound {
            what: "package",
            key: package_id.to_string(),
        })
    }
}

fn normalize_id(id: &str) -> String {
    crate::tx::normalize_address(id)
}
