//! Shared embedding data structures used across pipeline stages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Validated embedding vector: non-empty and every component finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Wraps raw components, rejecting empty or non-finite input.
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(RagError::InvalidEmbedding("vector is empty".into()));
        }
        if let Some(idx) = values.iter().position(|v| !v.is_finite()) {
            return Err(RagError::InvalidEmbedding(format!(
                "component {idx} is not finite"
            )));
        }
        Ok(Self(values))
    }

    /// Converts provider-supplied doubles, rejecting values that do not survive
    /// the narrowing to `f32`.
    pub fn from_f64s(values: &[f64]) -> Result<Self> {
        Self::new(values.iter().map(|v| *v as f32).collect())
    }

    /// Number of components.
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Borrowed view of the components.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Serializes to `4 * D` little-endian bytes for opaque storage.
    pub fn to_blob(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.0.len() * F32_BYTES);
        for value in &self.0 {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Restores a vector from bytes written by [`EmbeddingVector::to_blob`].
    pub fn from_blob(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() || bytes.len() % F32_BYTES != 0 {
            return Err(RagError::InvalidEmbedding(format!(
                "blob length {} is not a positive multiple of {F32_BYTES}",
                bytes.len()
            )));
        }
        let values = bytes
            .chunks_exact(F32_BYTES)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Self::new(values)
    }
}

impl<'de> Deserialize<'de> for EmbeddingVector {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Vec::<f32>::deserialize(deserializer)?;
        EmbeddingVector::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Category of the entity an embedding describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordKind {
    /// A task from the user's task list.
    Task,
    /// Any other category the host application chooses to embed.
    Other(String),
}

impl RecordKind {
    /// Storage label for the kind.
    pub fn as_str(&self) -> &str {
        match self {
            RecordKind::Task => "task",
            RecordKind::Other(label) => label.as_str(),
        }
    }
}

impl From<String> for RecordKind {
    fn from(value: String) -> Self {
        if value.eq_ignore_ascii_case("task") {
            RecordKind::Task
        } else {
            RecordKind::Other(value)
        }
    }
}

impl From<&str> for RecordKind {
    fn from(value: &str) -> Self {
        RecordKind::from(value.to_string())
    }
}

impl From<RecordKind> for String {
    fn from(value: RecordKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored vector, keyed by owner id and kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    /// Identifier of the owning entity.
    pub id: i64,
    /// Category of the owning entity.
    pub kind: RecordKind,
    /// Decoded vector.
    pub vector: EmbeddingVector,
}

/// Raw stored embedding as read from a storage backend.
///
/// Older rows hold a JSON array string instead of the binary blob; both shapes
/// are normalized into an [`EmbeddingVector`] here and nowhere else.
#[derive(Debug, Clone)]
pub enum StoredEmbedding {
    /// Little-endian `f32` bytes.
    Blob(Vec<u8>),
    /// JSON array text such as `[0.1, 0.2]`.
    Json(String),
}

impl StoredEmbedding {
    /// Decodes the stored form into a validated vector.
    pub fn decode(&self) -> Result<EmbeddingVector> {
        match self {
            StoredEmbedding::Blob(bytes) => EmbeddingVector::from_blob(bytes),
            StoredEmbedding::Json(text) => {
                let values: Vec<f64> = serde_json::from_str(text).map_err(|err| {
                    RagError::InvalidEmbedding(format!("stored JSON embedding: {err}"))
                })?;
                EmbeddingVector::from_f64s(&values)
            }
        }
    }
}
