//! Stored samples and similarity query results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Embedding;

/// Metadata key recording where a sample came from.
pub const SOURCE_KEY: &str = "source";

/// Metadata key recording the prompt that produced an AI-generated sample.
pub const TRIGGER_PROMPT_KEY: &str = "trigger_prompt";

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl MetadataValue {
    /// Borrow the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Open mapping from string keys to scalar values.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Build a [`Metadata`] map from key/value pairs.
pub fn metadata<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Metadata
where
    K: Into<String>,
    V: Into<MetadataValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A unit of stored writing style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unique identifier, minted by the pipeline.
    pub id: String,

    /// The sample text.
    pub text: String,

    /// The embedding vector.
    pub embedding: Embedding,

    /// Associated metadata.
    #[serde(default)]
    pub metadata: Metadata,

    /// When the sample was created.
    pub created_at: DateTime<Utc>,
}

impl Sample {
    /// Create a new sample stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        embedding: Embedding,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// The `source` tag, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(MetadataValue::as_str)
    }
}

/// A single hit from a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// ID of the matched sample.
    pub id: String,

    /// Text of the matched sample.
    pub text: String,

    /// Metadata of the matched sample.
    pub metadata: Metadata,

    /// Distance to the query (smaller is more similar).
    pub distance: f32,
}
