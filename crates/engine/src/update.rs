//! Field updates and the per-record batch applier
//!
//! `apply_batch` is the pure part of the single-key update path: it takes a
//! private working copy of a record and applies every field update to it in
//! order. The caller persists the copy only if the whole batch succeeded;
//! on the first error the copy is dropped, so no attribute (and no map
//! created along the way) is ever written for a failed batch.

use atomdoc_core::{
    apply, resolve_or_create, AtomicOp, Document, Error, FieldPath, Limits, Path, Record,
    Result, SpaceSchema,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One atomic operation on one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    /// Attribute and document path to modify
    pub field: FieldPath,
    /// Operation to apply
    pub op: AtomicOp,
    /// Operand of the operation
    pub operand: Document,
}

impl FieldUpdate {
    /// Build from a combined field path such as `v.c.d`
    ///
    /// # Examples
    ///
    /// ```
    /// use atomdoc_core::AtomicOp;
    /// use atomdoc_engine::FieldUpdate;
    ///
    /// let update = FieldUpdate::new("v.c.d", AtomicOp::Add, 1i64).unwrap();
    /// assert_eq!(update.field.attribute(), "v");
    /// assert!(FieldUpdate::new("v..d", AtomicOp::Add, 1i64).is_err());
    /// ```
    pub fn new(field: &str, op: AtomicOp, operand: impl Into<Document>) -> Result<Self> {
        Ok(FieldUpdate {
            field: FieldPath::parse(field)?,
            op,
            operand: operand.into(),
        })
    }

    /// Build from an attribute name and a document path string
    ///
    /// An empty `path` addresses the whole attribute.
    pub fn at(
        attribute: &str,
        path: &str,
        op: AtomicOp,
        operand: impl Into<Document>,
    ) -> Result<Self> {
        if attribute.is_empty() {
            return Err(atomdoc_core::PathParseError::Empty.into());
        }
        Ok(FieldUpdate {
            field: FieldPath::new(attribute, Path::parse(path)?),
            op,
            operand: operand.into(),
        })
    }

    /// Shorthand for `Add`
    pub fn add(field: &str, operand: impl Into<Document>) -> Result<Self> {
        Self::new(field, AtomicOp::Add, operand)
    }

    /// Shorthand for `Set`
    pub fn set(field: &str, operand: impl Into<Document>) -> Result<Self> {
        Self::new(field, AtomicOp::Set, operand)
    }
}

/// Result of a single-key update that did not error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Every operation succeeded and the record was written back
    Applied {
        /// Version assigned to the written record
        version: u64,
    },
    /// The key does not exist; nothing was written
    NotApplied,
}

impl UpdateOutcome {
    /// Check whether the record was written
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied { .. })
    }
}

/// Reject batches that can never succeed on any record of the space
///
/// # Errors
///
/// - `KeyAttributeImmutable` if an update targets the key attribute
/// - `LimitExceeded` if a field path is longer than allowed
pub fn validate_batch(schema: &SpaceSchema, updates: &[FieldUpdate], limits: &Limits) -> Result<()> {
    for update in updates {
        if update.field.attribute() == schema.key_attribute {
            return Err(Error::KeyAttributeImmutable {
                attribute: schema.key_attribute.clone(),
            });
        }
        limits.validate_path(&update.field.to_string())?;
    }
    Ok(())
}

/// Apply every update to `record` in order
///
/// A missing attribute starts as Null. Attributes touched by the batch are
/// re-validated against `limits` once all operations have run.
///
/// # Errors
///
/// The first executor, path or limit error. `record` is left partially
/// modified and must be discarded.
pub fn apply_batch(record: &mut Record, updates: &[FieldUpdate], limits: &Limits) -> Result<()> {
    let mut touched = BTreeSet::new();
    for update in updates {
        let attribute = update.field.attribute();
        let root = record
            .attributes
            .entry(attribute.to_string())
            .or_insert(Document::Null);
        let target = resolve_or_create(root, update.field.path())?;
        let current = std::mem::take(target);
        *target = apply(current, update.op, &update.operand)?;
        touched.insert(attribute);
    }

    for attribute in touched {
        if let Some(doc) = record.attributes.get(attribute) {
            limits.validate_document(doc)?;
        }
    }
    Ok(())
}
