//! Path resolver
//!
//! This module defines how a dotted path string addresses a sub-value of a
//! [`Document`]:
//! - Path: ordered segments, e.g. `c.d` or `items.0.name`
//! - PathSegment: one `.`-separated component
//! - FieldPath: an attribute name followed by a document path (`v.c.d`)
//!
//! # Path Syntax
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | (empty) | Root (the whole attribute value) |
//! | `key` | Map key |
//! | `3` | Map key `"3"` in a Map, element 3 in a List |
//! | `a.b.c` | Nested segments |
//!
//! `.` is a hard separator. There is no escape for a literal `.` inside a
//! map key, so such keys cannot be addressed.
//!
//! Whether a numeric segment is a list index is decided at resolution time
//! by the kind of container it is applied to. A non-numeric segment applied
//! to a List is a `PathTypeMismatch`, never a silent index.

use crate::document::Document;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// The whole path string is empty where an attribute is required
    #[error("empty path")]
    Empty,
    /// A segment between separators is empty
    #[error("empty segment at position {0}")]
    EmptySegment(usize),
}

/// One `.`-separated component of a path
///
/// Every segment can act as a map key. Segments made only of ASCII digits
/// can additionally act as a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    name: String,
    index: Option<usize>,
}

impl PathSegment {
    /// Create a segment from its text
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let index = if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            name.parse::<usize>().ok()
        } else {
            None
        };
        PathSegment { name, index }
    }

    /// The segment used as a map key
    pub fn as_key(&self) -> &str {
        &self.name
    }

    /// The segment used as a list index, if it is numeric
    pub fn as_index(&self) -> Option<usize> {
        self.index
    }

    fn expected_container(&self) -> &'static str {
        if self.index.is_some() {
            "map or list"
        } else {
            "map"
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A path into a document
///
/// # Examples
///
/// ```
/// use atomdoc_core::path::Path;
///
/// let path: Path = "c.d".parse().unwrap();
/// assert_eq!(path.len(), 2);
/// assert_eq!(path.to_string(), "c.d");
///
/// let root: Path = "".parse().unwrap();
/// assert!(root.is_root());
///
/// assert!("c..d".parse::<Path>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        Path {
            segments: Vec::new(),
        }
    }

    /// Parse a dotted path string
    ///
    /// The empty string is the root path. Any empty segment (leading,
    /// trailing or doubled `.`) is rejected.
    pub fn parse(s: &str) -> std::result::Result<Self, PathParseError> {
        if s.is_empty() {
            return Ok(Path::root());
        }
        let segments = s
            .split('.')
            .enumerate()
            .map(|(pos, part)| {
                if part.is_empty() {
                    Err(PathParseError::EmptySegment(pos))
                } else {
                    Ok(PathSegment::new(part))
                }
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Path { segments })
    }

    /// Append a segment (builder pattern)
    pub fn segment(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::new(name));
        self
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Get the number of segments in the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the path has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render the first `n` segments, used for error locations
    fn prefix_string(&self, n: usize) -> String {
        self.segments[..n.min(self.segments.len())]
            .iter()
            .map(PathSegment::as_key)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix_string(self.segments.len()))
    }
}

/// An attribute name followed by a path inside that attribute's document
///
/// `v` addresses the whole attribute `v`; `v.c.d` addresses key `d` of map
/// `c` inside attribute `v`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath {
    attribute: String,
    path: Path,
}

impl FieldPath {
    /// Create from an attribute name and a pre-parsed document path
    pub fn new(attribute: impl Into<String>, path: Path) -> Self {
        FieldPath {
            attribute: attribute.into(),
            path,
        }
    }

    /// Parse `attribute[.segment]*`
    pub fn parse(s: &str) -> std::result::Result<Self, PathParseError> {
        if s.is_empty() {
            return Err(PathParseError::Empty);
        }
        match s.split_once('.') {
            None => Ok(FieldPath::new(s, Path::root())),
            Some(("", _)) => Err(PathParseError::EmptySegment(0)),
            Some((_, "")) => Err(PathParseError::EmptySegment(1)),
            Some((attribute, rest)) => {
                let path = Path::parse(rest).map_err(|e| match e {
                    PathParseError::EmptySegment(pos) => PathParseError::EmptySegment(pos + 1),
                    other => other,
                })?;
                Ok(FieldPath::new(attribute, path))
            }
        }
    }

    /// The attribute name
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The path inside the attribute's document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this addresses the whole attribute
    pub fn is_bare(&self) -> bool {
        self.path.is_root()
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            f.write_str(&self.attribute)
        } else {
            write!(f, "{}.{}", self.attribute, self.path)
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

fn mismatch(path: &Path, depth: usize, segment: &PathSegment, found: &Document) -> Error {
    Error::PathTypeMismatch {
        path: path.prefix_string(depth + 1),
        expected: segment.expected_container(),
        found: found.type_of(),
    }
}

fn list_index(
    path: &Path,
    depth: usize,
    segment: &PathSegment,
    container: &Document,
    len: usize,
) -> Result<usize> {
    match segment.as_index() {
        Some(idx) if idx < len => Ok(idx),
        Some(_) => Err(Error::not_found(path.prefix_string(depth + 1))),
        None => Err(mismatch(path, depth, segment, container)),
    }
}

/// Locate the sub-document at `path`
///
/// # Errors
///
/// - `NotFound` if a map key is absent or a list index is out of range
/// - `PathTypeMismatch` if a segment is applied to the wrong kind of value
///
/// # Examples
///
/// ```
/// use atomdoc_core::{path::resolve, Document, Path};
///
/// let doc: Document = serde_json::json!({"c": {"d": 1, "l": [10, 20]}}).into();
/// assert_eq!(resolve(&doc, &"c.d".parse().unwrap()).unwrap(), &Document::Int(1));
/// assert_eq!(resolve(&doc, &"c.l.1".parse().unwrap()).unwrap(), &Document::Int(20));
/// assert!(resolve(&doc, &"c.x".parse().unwrap()).is_err());
/// ```
pub fn resolve<'a>(doc: &'a Document, path: &Path) -> Result<&'a Document> {
    let mut current = doc;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = match current {
            Document::Map(m) => m
                .get(segment.as_key())
                .ok_or_else(|| Error::not_found(path.prefix_string(depth + 1)))?,
            Document::List(l) => {
                let idx = list_index(path, depth, segment, current, l.len())?;
                &l[idx]
            }
            other => return Err(mismatch(path, depth, segment, other)),
        };
    }
    Ok(current)
}

/// Mutable variant of [`resolve`] with the same strictness
pub fn resolve_mut<'a>(doc: &'a mut Document, path: &Path) -> Result<&'a mut Document> {
    let mut current = doc;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = match current {
            Document::Map(m) => m
                .get_mut(segment.as_key())
                .ok_or_else(|| Error::not_found(path.prefix_string(depth + 1)))?,
            Document::List(l) => match segment.as_index() {
                Some(idx) if idx < l.len() => &mut l[idx],
                Some(_) => return Err(Error::not_found(path.prefix_string(depth + 1))),
                None => {
                    return Err(Error::PathTypeMismatch {
                        path: path.prefix_string(depth + 1),
                        expected: segment.expected_container(),
                        found: crate::document::DocumentType::List,
                    })
                }
            },
            other => return Err(mismatch(path, depth, segment, other)),
        };
    }
    Ok(current)
}

/// Locate the sub-document at `path`, creating missing map entries
///
/// - A Null root with a non-empty path becomes an empty Map (the attribute
///   did not exist yet)
/// - A missing intermediate map key becomes an empty Map, never a List
/// - A missing final map key becomes a Null placeholder
/// - List indices are never auto-extended: out of range is `NotFound`
///
/// Scalars (including an existing Null) below the root are not containers
/// and fail with `PathTypeMismatch`.
///
/// The caller owns `doc` exclusively; on a later failure it must discard
/// the document so created placeholders are never persisted.
pub fn resolve_or_create<'a>(doc: &'a mut Document, path: &Path) -> Result<&'a mut Document> {
    if doc.is_null() && !path.is_root() {
        *doc = Document::map();
    }

    let segments = path.segments();
    let last = segments.len().saturating_sub(1);
    let mut current = doc;
    for (depth, segment) in segments.iter().enumerate() {
        current = match current {
            Document::Map(m) => {
                let fill = if depth == last {
                    Document::Null
                } else {
                    Document::map()
                };
                m.entry(segment.as_key().to_string()).or_insert(fill)
            }
            Document::List(l) => match segment.as_index() {
                Some(idx) if idx < l.len() => &mut l[idx],
                Some(_) => return Err(Error::not_found(path.prefix_string(depth + 1))),
                None => {
                    return Err(Error::PathTypeMismatch {
                        path: path.prefix_string(depth + 1),
                        expected: segment.expected_container(),
                        found: crate::document::DocumentType::List,
                    })
                }
            },
            other => return Err(mismatch(path, depth, segment, other)),
        };
    }
    Ok(current)
}
