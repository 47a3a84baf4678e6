//! Core types and traits for atomdoc
//!
//! This crate defines the foundational pieces of the document update engine:
//! - Document: recursive tagged value with typed equality and ordering
//! - Path / FieldPath: dotted paths and the resolver that walks them
//! - AtomicOp / apply: the typed atomic operation executor
//! - Predicate: conjunctive conditions over record attributes
//! - Record / PrimaryKey / SpaceSchema: the storage unit
//! - RecordStore: the storage collaborator trait
//! - Limits: document size limits
//! - Error: the error type shared by every crate

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod atomic;
pub mod document;
pub mod error;
pub mod limits;
pub mod path;
pub mod predicate;
pub mod record;
pub mod traits;

pub use atomic::{apply, AtomicOp};
pub use document::{Document, DocumentType};
pub use error::{Error, Result};
pub use limits::{LimitError, Limits};
pub use path::{resolve, resolve_mut, resolve_or_create, FieldPath, Path, PathParseError, PathSegment};
pub use predicate::{Comparator, Condition, Predicate};
pub use record::{PrimaryKey, Record, SpaceSchema, StoredRecord};
pub use traits::{RecordScan, RecordStore};
