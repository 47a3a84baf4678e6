//! Atomic operation executor
//!
//! `apply(current, op, operand)` computes the replacement for one addressed
//! sub-value. It never mutates in place and never coerces silently: every
//! accepted (current, operand) pairing is listed below, everything else is
//! `TypeMismatch`.
//!
//! | op | current | operand | result |
//! |----|---------|---------|--------|
//! | Add, Sub | Null, Int, Float | Int, Float | arithmetic; Null acts as 0 |
//! | Mul | Int, Float | Int, Float | arithmetic |
//! | Div, Mod | Int, Float | Int, Float | arithmetic; zero divisor fails |
//! | And, Or, Xor | Bool / Int | Bool / Int (same kind) | logical / bitwise |
//! | Min, Max | Int, Float / String | Int, Float / String | keep current unless operand is strictly better |
//! | Append, Prepend | Null, String, Bytes, List | see [`AtomicOp::Append`] | concatenation |
//! | Set | any | any | operand |
//!
//! Int combined with Float widens to Float. Integer arithmetic is checked
//! and fails with `Overflow`; a Float result that is not finite also fails
//! with `Overflow`.

use crate::document::Document;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Opcode of an atomic field operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomicOp {
    /// Numeric addition; a missing field counts as zero
    Add,
    /// Numeric subtraction; a missing field counts as zero
    Sub,
    /// Numeric multiplication
    Mul,
    /// Numeric division
    Div,
    /// Numeric remainder (sign follows the dividend)
    Mod,
    /// Logical AND on Bool, bitwise AND on Int
    And,
    /// Logical OR on Bool, bitwise OR on Int
    Or,
    /// Logical XOR on Bool, bitwise XOR on Int
    Xor,
    /// Keep the smaller of current and operand
    Min,
    /// Keep the larger of current and operand
    Max,
    /// Unconditional replace
    Set,
    /// String/Bytes concatenation, or push onto the back of a List
    ///
    /// On a missing field a String or Bytes operand becomes the value and any
    /// other operand becomes a one-element List.
    Append,
    /// String/Bytes concatenation in front, or push onto the front of a List
    Prepend,
}

impl AtomicOp {
    /// Lowercase opcode name
    pub fn as_str(&self) -> &'static str {
        match self {
            AtomicOp::Add => "add",
            AtomicOp::Sub => "sub",
            AtomicOp::Mul => "mul",
            AtomicOp::Div => "div",
            AtomicOp::Mod => "mod",
            AtomicOp::And => "and",
            AtomicOp::Or => "or",
            AtomicOp::Xor => "xor",
            AtomicOp::Min => "min",
            AtomicOp::Max => "max",
            AtomicOp::Set => "set",
            AtomicOp::Append => "append",
            AtomicOp::Prepend => "prepend",
        }
    }
}

impl fmt::Display for AtomicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the new value for `current` under `op` with `operand`
///
/// # Examples
///
/// ```
/// use atomdoc_core::{apply, AtomicOp, Document};
///
/// assert_eq!(apply(Document::Int(1), AtomicOp::Add, &Document::Int(1)).unwrap(), Document::Int(2));
/// assert_eq!(apply(Document::Null, AtomicOp::Add, &Document::Int(5)).unwrap(), Document::Int(5));
/// assert!(apply(Document::from("b"), AtomicOp::Add, &Document::Int(1)).is_err());
/// ```
pub fn apply(current: Document, op: AtomicOp, operand: &Document) -> Result<Document> {
    match op {
        AtomicOp::Set => Ok(operand.clone()),
        AtomicOp::Add | AtomicOp::Sub | AtomicOp::Mul | AtomicOp::Div | AtomicOp::Mod => {
            arithmetic(current, op, operand)
        }
        AtomicOp::And | AtomicOp::Or | AtomicOp::Xor => logical(current, op, operand),
        AtomicOp::Min | AtomicOp::Max => extremum(current, op, operand),
        AtomicOp::Append | AtomicOp::Prepend => concat(current, op, operand),
    }
}

fn mismatch(op: AtomicOp, current: &Document, operand: &Document) -> Error {
    Error::type_mismatch(op, current.type_of(), operand.type_of())
}

fn arithmetic(current: Document, op: AtomicOp, operand: &Document) -> Result<Document> {
    // Null is the additive identity in the operand's own family
    let current = if current.is_null() && matches!(op, AtomicOp::Add | AtomicOp::Sub) {
        match operand {
            Document::Int(_) => Document::Int(0),
            Document::Float(_) => Document::Float(0.0),
            _ => current,
        }
    } else {
        current
    };

    match (&current, operand) {
        (Document::Int(a), Document::Int(b)) => int_arithmetic(*a, op, *b),
        (Document::Int(a), Document::Float(b)) => float_arithmetic(*a as f64, op, *b),
        (Document::Float(a), Document::Int(b)) => float_arithmetic(*a, op, *b as f64),
        (Document::Float(a), Document::Float(b)) => float_arithmetic(*a, op, *b),
        _ => Err(mismatch(op, &current, operand)),
    }
}

fn int_arithmetic(a: i64, op: AtomicOp, b: i64) -> Result<Document> {
    if matches!(op, AtomicOp::Div | AtomicOp::Mod) && b == 0 {
        return Err(Error::DivideByZero);
    }
    let result = match op {
        AtomicOp::Add => a.checked_add(b),
        AtomicOp::Sub => a.checked_sub(b),
        AtomicOp::Mul => a.checked_mul(b),
        AtomicOp::Div => a.checked_div(b),
        AtomicOp::Mod => a.checked_rem(b),
        _ => None,
    };
    result.map(Document::Int).ok_or(Error::Overflow { op })
}

fn float_arithmetic(a: f64, op: AtomicOp, b: f64) -> Result<Document> {
    if matches!(op, AtomicOp::Div | AtomicOp::Mod) && b == 0.0 {
        return Err(Error::DivideByZero);
    }
    let result = match op {
        AtomicOp::Add => a + b,
        AtomicOp::Sub => a - b,
        AtomicOp::Mul => a * b,
        AtomicOp::Div => a / b,
        AtomicOp::Mod => a % b,
        _ => f64::NAN,
    };
    if result.is_finite() {
        Ok(Document::Float(result))
    } else {
        Err(Error::Overflow { op })
    }
}

fn logical(current: Document, op: AtomicOp, operand: &Document) -> Result<Document> {
    match (&current, operand) {
        (Document::Bool(a), Document::Bool(b)) => Ok(Document::Bool(match op {
            AtomicOp::And => *a && *b,
            AtomicOp::Or => *a || *b,
            _ => *a ^ *b,
        })),
        (Document::Int(a), Document::Int(b)) => Ok(Document::Int(match op {
            AtomicOp::And => a & b,
            AtomicOp::Or => a | b,
            _ => a ^ b,
        })),
        _ => Err(mismatch(op, &current, operand)),
    }
}

fn extremum(current: Document, op: AtomicOp, operand: &Document) -> Result<Document> {
    let ordering = match (&current, operand) {
        (Document::Int(a), Document::Int(b)) => Some(b.cmp(a)),
        (Document::Int(a), Document::Float(b)) => int_float_cmp(*a, *b).map(Ordering::reverse),
        (Document::Float(a), Document::Int(b)) => int_float_cmp(*b, *a),
        (Document::Float(a), Document::Float(b)) => b.partial_cmp(a),
        (Document::String(a), Document::String(b)) => Some(b.cmp(a)),
        _ => return Err(mismatch(op, &current, operand)),
    };

    let wanted = if op == AtomicOp::Min {
        Ordering::Less
    } else {
        Ordering::Greater
    };
    // An unordered comparison (NaN) keeps the current value
    if ordering == Some(wanted) {
        Ok(operand.clone())
    } else {
        Ok(current)
    }
}

/// Exact ordering of an integer against a float
///
/// The `as f64` cast rounds above 2^53, so a cast that lands exactly on the
/// float is settled in i128, where both values are exact.
fn int_float_cmp(i: i64, f: f64) -> Option<Ordering> {
    match (i as f64).partial_cmp(&f)? {
        Ordering::Equal => Some((i as i128).cmp(&(f as i128))),
        ordering => Some(ordering),
    }
}

fn concat(current: Document, op: AtomicOp, operand: &Document) -> Result<Document> {
    let front = op == AtomicOp::Prepend;
    match (current, operand) {
        (Document::Null, Document::String(_) | Document::Bytes(_)) => Ok(operand.clone()),
        (Document::Null, _) => Ok(Document::List(vec![operand.clone()])),
        (Document::String(mut s), Document::String(o)) => {
            if front {
                s.insert_str(0, o);
            } else {
                s.push_str(o);
            }
            Ok(Document::String(s))
        }
        (Document::Bytes(mut b), Document::Bytes(o)) => {
            if front {
                b.splice(0..0, o.iter().copied());
            } else {
                b.extend_from_slice(o);
            }
            Ok(Document::Bytes(b))
        }
        (Document::List(mut l), _) => {
            if front {
                l.insert(0, operand.clone());
            } else {
                l.push(operand.clone());
            }
            Ok(Document::List(l))
        }
        (other, _) => Err(mismatch(op, &other, operand)),
    }
}
