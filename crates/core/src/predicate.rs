//! Predicate matcher
//!
//! A [`Predicate`] is a conjunction of conditions, each a field path plus a
//! [`Comparator`]. A record matches when every condition holds.
//!
//! Resolution failures are not errors here: a condition whose path does not
//! resolve (missing attribute, missing key, wrong container kind) simply
//! does not hold, so the record is unmatched.
//!
//! Comparisons use the document model's typed equality and ordering. Values
//! of different kinds never compare equal and are never ordered, so
//! `Int(2)` does not match `Equals(Float(2.0))` and a String never satisfies
//! `LessThan(Int(..))`.

use crate::document::Document;
use crate::error::Result;
use crate::path::{resolve, FieldPath};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a resolved value is compared against a condition's operand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Comparator {
    /// Typed equality
    Equals(Document),
    /// Strictly less than (same kind only)
    LessThan(Document),
    /// Less than or equal (same kind only)
    LessEqual(Document),
    /// Strictly greater than (same kind only)
    GreaterThan(Document),
    /// Greater than or equal (same kind only)
    GreaterEqual(Document),
    /// Inclusive range `low <= value <= high` (same kind only)
    Range {
        /// Lower bound
        low: Document,
        /// Upper bound
        high: Document,
    },
    /// Length (bytes for String/Bytes, elements for List/Map) equals
    LengthEquals(usize),
    /// Length at most
    LengthLessEqual(usize),
    /// Length at least
    LengthGreaterEqual(usize),
    /// Substring for String, sub-slice for Bytes, element for List, key for Map
    Contains(Document),
}

impl Comparator {
    /// Evaluate against a resolved value
    pub fn evaluate(&self, value: &Document) -> bool {
        match self {
            Comparator::Equals(v) => value == v,
            Comparator::LessThan(v) => value.typed_cmp(v) == Some(Ordering::Less),
            Comparator::LessEqual(v) => {
                matches!(value.typed_cmp(v), Some(Ordering::Less | Ordering::Equal))
            }
            Comparator::GreaterThan(v) => value.typed_cmp(v) == Some(Ordering::Greater),
            Comparator::GreaterEqual(v) => {
                matches!(value.typed_cmp(v), Some(Ordering::Greater | Ordering::Equal))
            }
            Comparator::Range { low, high } => {
                matches!(value.typed_cmp(low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(value.typed_cmp(high), Some(Ordering::Less | Ordering::Equal))
            }
            Comparator::LengthEquals(n) => value.len() == Some(*n),
            Comparator::LengthLessEqual(n) => value.len().map_or(false, |len| len <= *n),
            Comparator::LengthGreaterEqual(n) => value.len().map_or(false, |len| len >= *n),
            Comparator::Contains(needle) => contains(value, needle),
        }
    }
}

fn contains(value: &Document, needle: &Document) -> bool {
    match (value, needle) {
        (Document::String(s), Document::String(n)) => s.contains(n.as_str()),
        (Document::Bytes(b), Document::Bytes(n)) => {
            n.is_empty() || b.windows(n.len()).any(|w| w == n.as_slice())
        }
        (Document::List(l), _) => l.contains(needle),
        (Document::Map(m), Document::String(k)) => m.contains_key(k),
        _ => false,
    }
}

/// One `(path, comparator)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Attribute (and optional document path) to test
    pub path: FieldPath,
    /// Test applied to the resolved value
    pub comparator: Comparator,
}

impl Condition {
    /// Create a condition
    pub fn new(path: FieldPath, comparator: Comparator) -> Self {
        Condition { path, comparator }
    }
}

/// Conjunction of conditions
///
/// The empty predicate matches every record.
///
/// # Examples
///
/// ```
/// use atomdoc_core::{Comparator, Predicate, Record};
///
/// let record = Record::new("k").with("v", serde_json::json!({"c": {"d": 2}}));
/// let pred = Predicate::new().equals("v.c.d", 2i64).unwrap();
/// assert!(pred.matches("k", &record));
///
/// let pred = Predicate::new()
///     .condition("v.c.d", Comparator::GreaterThan(5i64.into()))
///     .unwrap();
/// assert!(!pred.matches("k", &record));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// Create an empty predicate
    pub fn new() -> Self {
        Predicate::default()
    }

    /// Add a condition from a path string
    ///
    /// Fails with `MalformedPath` if `path` does not parse.
    pub fn condition(mut self, path: &str, comparator: Comparator) -> Result<Self> {
        let path = FieldPath::parse(path)?;
        self.conditions.push(Condition::new(path, comparator));
        Ok(self)
    }

    /// Add an equality condition
    pub fn equals(self, path: &str, value: impl Into<Document>) -> Result<Self> {
        self.condition(path, Comparator::Equals(value.into()))
    }

    /// Add a pre-built condition
    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Get the conditions
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Check whether this predicate has no conditions
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate against a record
    ///
    /// `key_attribute` is the space's key attribute name; a condition on it
    /// tests the record's primary key.
    pub fn matches(&self, key_attribute: &str, record: &Record) -> bool {
        self.conditions.iter().all(|cond| {
            let key_doc;
            let root = if cond.path.attribute() == key_attribute {
                key_doc = record.key.to_document();
                &key_doc
            } else {
                match record.attribute(cond.path.attribute()) {
                    Some(doc) => doc,
                    None => return false,
                }
            };
            match resolve(root, cond.path.path()) {
                Ok(value) => cond.comparator.evaluate(value),
                Err(_) => false,
            }
        })
    }
}
