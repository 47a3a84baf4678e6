//! Document model
//!
//! This module defines:
//! - Document: recursive tagged value stored in a record's attributes
//! - DocumentType: type introspection tag
//!
//! ## Type Rules
//!
//! - Eight kinds only: Null, Bool, Int, Float, String, Bytes, List, Map
//! - No implicit coercion. The only numeric widening happens inside the
//!   atomic executor (`atomic.rs`), never here
//! - `Int(1) != Float(1.0)`: different kinds are NEVER equal
//! - `Bytes` are not `String`
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//!
//! Documents are trees. Every node is exclusively owned by its parent, so a
//! clone of a record's document can be mutated without touching any other
//! record.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// A semi-structured document value
///
/// Map keys are unique; insertion order is irrelevant for equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Document {
    /// Null value, also the placeholder for a field that does not exist yet
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Ordered list of documents
    List(Vec<Document>),
    /// Map with unique string keys
    Map(HashMap<String, Document>),
}

/// Kind of a [`Document`] node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Null
    Null,
    /// Bool
    Bool,
    /// Int
    Int,
    /// Float
    Float,
    /// String
    String,
    /// Bytes
    Bytes,
    /// List
    List,
    /// Map
    Map,
}

impl DocumentType {
    /// Lowercase name used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Null => "null",
            DocumentType::Bool => "bool",
            DocumentType::Int => "int",
            DocumentType::Float => "float",
            DocumentType::String => "string",
            DocumentType::Bytes => "bytes",
            DocumentType::List => "list",
            DocumentType::Map => "map",
        }
    }

    /// Int or Float
    pub fn is_numeric(&self) -> bool {
        matches!(self, DocumentType::Int | DocumentType::Float)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Structural, type-sensitive equality with IEEE-754 float semantics
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Document::Null, Document::Null) => true,
            (Document::Bool(a), Document::Bool(b)) => a == b,
            (Document::Int(a), Document::Int(b)) => a == b,
            (Document::Float(a), Document::Float(b)) => a == b,
            (Document::String(a), Document::String(b)) => a == b,
            (Document::Bytes(a), Document::Bytes(b)) => a == b,
            (Document::List(a), Document::List(b)) => a == b,
            (Document::Map(a), Document::Map(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            _ => false,
        }
    }
}

impl Document {
    /// Create an empty map
    pub fn map() -> Self {
        Document::Map(HashMap::new())
    }

    /// Create an empty list
    pub fn list() -> Self {
        Document::List(Vec::new())
    }

    /// Type introspection
    pub fn type_of(&self) -> DocumentType {
        match self {
            Document::Null => DocumentType::Null,
            Document::Bool(_) => DocumentType::Bool,
            Document::Int(_) => DocumentType::Int,
            Document::Float(_) => DocumentType::Float,
            Document::String(_) => DocumentType::String,
            Document::Bytes(_) => DocumentType::Bytes,
            Document::List(_) => DocumentType::List,
            Document::Map(_) => DocumentType::Map,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    /// Check if this is a map
    pub fn is_map(&self) -> bool {
        matches!(self, Document::Map(_))
    }

    /// Check if this is a list
    pub fn is_list(&self) -> bool {
        matches!(self, Document::List(_))
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Document::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Document::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a Bytes value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Document::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Get as &[Document] if this is a List value
    pub fn as_list(&self) -> Option<&[Document]> {
        match self {
            Document::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get as &HashMap if this is a Map value
    pub fn as_map(&self) -> Option<&HashMap<String, Document>> {
        match self {
            Document::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key if this is a Map value
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_map().and_then(|m| m.get(key))
    }

    /// Length for length predicates
    ///
    /// Byte length for String and Bytes, element count for List and Map.
    /// Scalars have no length.
    pub fn len(&self) -> Option<usize> {
        match self {
            Document::String(s) => Some(s.len()),
            Document::Bytes(b) => Some(b.len()),
            Document::List(l) => Some(l.len()),
            Document::Map(m) => Some(m.len()),
            _ => None,
        }
    }

    /// Typed ordering
    ///
    /// Only values of the same kind are ordered: Bool, Int, Float, String
    /// (lexicographic) and Bytes (lexicographic). Everything else, including
    /// Int against Float, is unordered and returns `None`. NaN is unordered.
    pub fn typed_cmp(&self, other: &Document) -> Option<Ordering> {
        match (self, other) {
            (Document::Bool(a), Document::Bool(b)) => Some(a.cmp(b)),
            (Document::Int(a), Document::Int(b)) => Some(a.cmp(b)),
            (Document::Float(a), Document::Float(b)) => a.partial_cmp(b),
            (Document::String(a), Document::String(b)) => Some(a.cmp(b)),
            (Document::Bytes(a), Document::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Maximum nesting depth (0 for scalars)
    pub fn nesting_depth(&self) -> usize {
        match self {
            Document::List(l) => 1 + l.iter().map(Document::nesting_depth).max().unwrap_or(0),
            Document::Map(m) => 1 + m.values().map(Document::nesting_depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Bool(b)
    }
}

impl From<i64> for Document {
    fn from(i: i64) -> Self {
        Document::Int(i)
    }
}

impl From<i32> for Document {
    fn from(i: i32) -> Self {
        Document::Int(i as i64)
    }
}

impl From<f64> for Document {
    fn from(f: f64) -> Self {
        Document::Float(f)
    }
}

impl From<Vec<u8>> for Document {
    fn from(b: Vec<u8>) -> Self {
        Document::Bytes(b)
    }
}

impl From<&[u8]> for Document {
    fn from(b: &[u8]) -> Self {
        Document::Bytes(b.to_vec())
    }
}

impl From<Vec<Document>> for Document {
    fn from(l: Vec<Document>) -> Self {
        Document::List(l)
    }
}

impl From<HashMap<String, Document>> for Document {
    fn from(m: HashMap<String, Document>) -> Self {
        Document::Map(m)
    }
}

impl From<()> for Document {
    fn from(_: ()) -> Self {
        Document::Null
    }
}

// ============================================================================
// serde_json interop for ergonomic document construction
// ============================================================================

impl From<serde_json::Value> for Document {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Document::Null,
            serde_json::Value::Bool(b) => Document::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Document::Int(i),
                // u64 beyond i64 range and real numbers both land here
                None => Document::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Document::String(s),
            serde_json::Value::Array(arr) => {
                Document::List(arr.into_iter().map(Document::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Document::Map(obj.into_iter().map(|(k, v)| (k, Document::from(v))).collect())
            }
        }
    }
}

impl From<Document> for serde_json::Value {
    fn from(d: Document) -> Self {
        match d {
            Document::Null => serde_json::Value::Null,
            Document::Bool(b) => serde_json::Value::Bool(b),
            Document::Int(i) => serde_json::Value::Number(i.into()),
            Document::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Document::String(s) => serde_json::Value::String(s),
            // Lossy: bytes come back as a base64 string
            Document::Bytes(b) => serde_json::Value::String(BASE64.encode(b)),
            Document::List(l) => {
                serde_json::Value::Array(l.into_iter().map(serde_json::Value::from).collect())
            }
            Document::Map(m) => serde_json::Value::Object(
                m.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
