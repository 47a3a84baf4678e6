//! Size limits for documents and paths
//!
//! Every document the engine writes back is re-validated against these
//! limits, and every field path is checked before it is parsed. Violations
//! abort the single-key update with `LimitExceeded`.

use crate::document::Document;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size limits for documents and paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum nesting depth of a document (default: 128)
    pub max_nesting_depth: usize,

    /// Maximum field path length in bytes (default: 256)
    pub max_path_length: usize,

    /// Maximum string length in bytes (default: 16MB)
    pub max_string_bytes: usize,

    /// Maximum bytes length (default: 16MB)
    pub max_bytes_len: usize,

    /// Maximum list length (default: 1M elements)
    pub max_list_len: usize,

    /// Maximum map entries (default: 1M entries)
    pub max_map_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_nesting_depth: 128,
            max_path_length: 256,
            max_string_bytes: 16 * 1024 * 1024, // 16MB
            max_bytes_len: 16 * 1024 * 1024,    // 16MB
            max_list_len: 1_000_000,
            max_map_entries: 1_000_000,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            max_nesting_depth: 10,
            max_path_length: 64,
            max_string_bytes: 1000,
            max_bytes_len: 1000,
            max_list_len: 100,
            max_map_entries: 100,
        }
    }

    /// Validate a field path string length
    pub fn validate_path(&self, path: &str) -> Result<(), LimitError> {
        if path.len() > self.max_path_length {
            return Err(LimitError::PathTooLong {
                actual: path.len(),
                max: self.max_path_length,
            });
        }
        Ok(())
    }

    /// Validate a document against size limits
    ///
    /// Checks string and bytes length, list length, map entry count and
    /// nesting depth (recursive).
    pub fn validate_document(&self, doc: &Document) -> Result<(), LimitError> {
        self.validate_impl(doc, 0)
    }

    fn validate_impl(&self, doc: &Document, depth: usize) -> Result<(), LimitError> {
        if depth > self.max_nesting_depth {
            return Err(LimitError::NestingTooDeep {
                actual: depth,
                max: self.max_nesting_depth,
            });
        }

        match doc {
            Document::Null | Document::Bool(_) | Document::Int(_) | Document::Float(_) => Ok(()),

            Document::String(s) => {
                check_len("string_too_long", s.len(), self.max_string_bytes)
            }

            Document::Bytes(b) => check_len("bytes_too_long", b.len(), self.max_bytes_len),

            Document::List(l) => {
                check_len("list_too_long", l.len(), self.max_list_len)?;
                for v in l {
                    self.validate_impl(v, depth + 1)?;
                }
                Ok(())
            }

            Document::Map(m) => {
                check_len("map_too_many_entries", m.len(), self.max_map_entries)?;
                for v in m.values() {
                    self.validate_impl(v, depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

fn check_len(reason: &'static str, actual: usize, max: usize) -> Result<(), LimitError> {
    if actual > max {
        return Err(LimitError::DocumentTooLarge {
            reason,
            actual,
            max,
        });
    }
    Ok(())
}

/// Limit validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Field path exceeds maximum length
    #[error("path too long: {actual} bytes exceeds maximum {max}")]
    PathTooLong {
        /// Actual path length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// A document node exceeds a size limit
    #[error("document too large ({reason}): {actual} exceeds maximum {max}")]
    DocumentTooLarge {
        /// Reason code for the violation
        reason: &'static str,
        /// Actual size
        actual: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Document nesting exceeds maximum depth
    #[error("nesting too deep: {actual} levels exceeds maximum {max}")]
    NestingTooDeep {
        /// Actual nesting depth
        actual: usize,
        /// Maximum allowed depth
        max: usize,
    },
}
