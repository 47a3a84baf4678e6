//! Error types for atomdoc
//!
//! This module defines the single error enum used by every layer: the path
//! resolver, the atomic operation executor, the storage collaborator and the
//! update engine. We use `thiserror` for `Display` and `Error` impls.
//!
//! Outcomes that are *not* errors (a key that does not exist, a group
//! predicate that matched nothing) are modelled as return values instead.

use crate::atomic::AtomicOp;
use crate::document::DocumentType;
use crate::limits::LimitError;
use crate::path::PathParseError;
use thiserror::Error;

/// Result type alias for atomdoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for document updates
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Path string could not be parsed
    #[error("malformed path: {0}")]
    MalformedPath(#[from] PathParseError),

    /// Path resolves to nothing and creation is not permitted
    #[error("path not found: {path}")]
    NotFound {
        /// The path (as text) that failed to resolve
        path: String,
    },

    /// A segment's kind disagrees with the container it is applied to
    #[error("path type mismatch at '{path}': expected {expected}, found {found}")]
    PathTypeMismatch {
        /// Path prefix up to and including the offending segment
        path: String,
        /// Container kind the segment requires
        expected: &'static str,
        /// Actual kind found in the document
        found: DocumentType,
    },

    /// Opcode and operand are incompatible with the current value
    #[error("type mismatch: cannot apply {op} to {current} with {operand} operand")]
    TypeMismatch {
        /// The operation being applied
        op: AtomicOp,
        /// Type of the current value
        current: DocumentType,
        /// Type of the operand
        operand: DocumentType,
    },

    /// Div or Mod with a zero divisor
    #[error("division by zero")]
    DivideByZero,

    /// Integer overflow or non-finite float result
    #[error("arithmetic overflow applying {op}")]
    Overflow {
        /// The operation that overflowed
        op: AtomicOp,
    },

    /// Write-write race on a key
    #[error("write conflict on key {key} in space '{space}'")]
    Conflict {
        /// Space of the contended record
        space: String,
        /// Primary key of the contended record
        key: String,
    },

    /// Space is not defined in the store
    #[error("unknown space: {space}")]
    UnknownSpace {
        /// The requested space name
        space: String,
    },

    /// Atomic operations may not target the key attribute
    #[error("key attribute '{attribute}' cannot be modified")]
    KeyAttributeImmutable {
        /// The key attribute name
        attribute: String,
    },

    /// Document violates a size limit
    #[error("limit exceeded: {0}")]
    LimitExceeded(#[from] LimitError),

    /// Configuration could not be loaded or is invalid
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage collaborator failure
    ///
    /// Raised by `RecordStore` backends for I/O or transport faults. It is
    /// never retried; the engine fails that key and moves on.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Create a NotFound error for a path
    pub fn not_found(path: impl Into<String>) -> Self {
        Error::NotFound { path: path.into() }
    }

    /// Create a TypeMismatch error
    pub fn type_mismatch(op: AtomicOp, current: DocumentType, operand: DocumentType) -> Self {
        Error::TypeMismatch {
            op,
            current,
            operand,
        }
    }

    /// Create a Conflict error
    pub fn conflict(space: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Conflict {
            space: space.into(),
            key: key.into(),
        }
    }

    /// Create an UnknownSpace error
    pub fn unknown_space(space: impl Into<String>) -> Self {
        Error::UnknownSpace {
            space: space.into(),
        }
    }

    /// Create a Storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Check whether this error is a write-write conflict (retryable)
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Check whether this error came from the executor's type rules
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Error::TypeMismatch { .. } | Error::DivideByZero | Error::Overflow { .. }
        )
    }

    /// Check whether this error came from path resolution
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedPath(_) | Error::NotFound { .. } | Error::PathTypeMismatch { .. }
        )
    }
}
