use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key-value annotations attached to a document (source file, chunk position, content type...).
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Scalar metadata value. Serialized as a bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    /// Parse a command-line style value: bool, then integer, then float, else text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Ok(b) = raw.parse::<bool>() {
            return Self::Bool(b);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Self::Integer(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return Self::Float(f);
            }
        }
        Self::Text(raw.to_string())
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
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

/// A text fragment plus its metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Builder: set one metadata entry
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge `patch` into the metadata; patch keys overwrite existing ones.
    pub fn merge_metadata(&mut self, patch: Metadata) {
        self.metadata.extend(patch);
    }
}

/// The store's unit of storage. Its position in the store is its index row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoredRecord {
    pub id: String,
    pub document: Document,
}

/// One row of a [`crate::DocumentStore::list`] page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub id: String,
    #[serde(flatten)]
    pub document: Document,
}

/// A ranked similarity match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    /// Squared Euclidean distance to the query (lower is closer)
    pub distance: f32,
    /// `1 / (1 + distance)`, in `(0, 1]`. A display score, not a probability.
    pub relevance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub documents: usize,
    pub index_rows: usize,
    pub dimension: usize,
}

impl StoreStats {
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.documents == self.index_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn metadata_value_parse_order() {
        assert_eq!(MetadataValue::parse("true"), MetadataValue::Bool(true));
        assert_eq!(MetadataValue::parse("42"), MetadataValue::Integer(42));
        assert_eq!(MetadataValue::parse("0.5"), MetadataValue::Float(0.5));
        assert_eq!(
            MetadataValue::parse("report.pdf"),
            MetadataValue::Text("report.pdf".to_string())
        );
        assert_eq!(
            MetadataValue::parse("NaN"),
            MetadataValue::Text("NaN".to_string())
        );
    }

    #[test]
    fn metadata_serializes_as_plain_scalars() {
        let doc = Document::new("hello")
            .with_meta("source", "a.txt")
            .with_meta("chunk_id", 3_i64)
            .with_meta("score", 0.25)
            .with_meta("draft", false);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "text": "hello",
                "metadata": {"chunk_id": 3, "draft": false, "score": 0.25, "source": "a.txt"}
            })
        );
        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn merge_overwrites_patch_keys_only() {
        let mut doc = Document::new("x")
            .with_meta("source", "a.txt")
            .with_meta("type", "txt");
        let mut patch = Metadata::new();
        patch.insert("type".to_string(), "md".into());
        patch.insert("lang".to_string(), "th".into());
        doc.merge_metadata(patch);

        assert_eq!(doc.metadata["source"], MetadataValue::from("a.txt"));
        assert_eq!(doc.metadata["type"], MetadataValue::from("md"));
        assert_eq!(doc.metadata["lang"], MetadataValue::from("th"));
    }
}
