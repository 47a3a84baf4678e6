//! Records, primary keys and space schemas
//!
//! A record is the unit of storage: a primary key plus named attributes,
//! each attribute holding a [`Document`]. The storage collaborator owns
//! records; the engine only ever works on copies.

use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Primary key of a record
///
/// Keys are totally ordered so that scans and reports are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimaryKey {
    /// Integer key
    Int(i64),
    /// String key
    String(String),
    /// Binary key
    Bytes(Vec<u8>),
}

impl PrimaryKey {
    /// The key as a document, for predicates on the key attribute
    pub fn to_document(&self) -> Document {
        match self {
            PrimaryKey::Int(i) => Document::Int(*i),
            PrimaryKey::String(s) => Document::String(s.clone()),
            PrimaryKey::Bytes(b) => Document::Bytes(b.clone()),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Int(i) => write!(f, "{}", i),
            PrimaryKey::String(s) => write!(f, "{:?}", s),
            PrimaryKey::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for PrimaryKey {
    fn from(s: &str) -> Self {
        PrimaryKey::String(s.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(s: String) -> Self {
        PrimaryKey::String(s)
    }
}

impl From<i64> for PrimaryKey {
    fn from(i: i64) -> Self {
        PrimaryKey::Int(i)
    }
}

impl From<Vec<u8>> for PrimaryKey {
    fn from(b: Vec<u8>) -> Self {
        PrimaryKey::Bytes(b)
    }
}

/// A primary key plus named document attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key
    pub key: PrimaryKey,
    /// Attribute name to value
    pub attributes: HashMap<String, Document>,
}

impl Record {
    /// Create a record with no attributes
    pub fn new(key: impl Into<PrimaryKey>) -> Self {
        Record {
            key: key.into(),
            attributes: HashMap::new(),
        }
    }

    /// Set an attribute (builder pattern)
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Document>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    /// Get an attribute value
    pub fn attribute(&self, name: &str) -> Option<&Document> {
        self.attributes.get(name)
    }
}

/// A record together with the version token assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// The record as last written
    pub record: Record,
    /// Version token; changes on every successful put
    pub version: u64,
}

/// Definition of a space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSchema {
    /// Space name
    pub name: String,
    /// Name under which the primary key is addressable in predicates
    pub key_attribute: String,
}

impl SpaceSchema {
    /// Create a space schema
    pub fn new(name: impl Into<String>, key_attribute: impl Into<String>) -> Self {
        SpaceSchema {
            name: name.into(),
            key_attribute: key_attribute.into(),
        }
    }
}
