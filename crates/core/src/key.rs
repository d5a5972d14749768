//! Secondary key types
//!
//! This module defines:
//! - SecondaryKey: the value a secondary index groups records under
//! - KeyList: the per-record list of keys a key extractor produces
//!
//! ## Key Model
//!
//! Secondary keys are derived from record fields, so they must be hashable
//! and totally ordered. Floating point values are deliberately absent.
//!
//! - Different variants are NEVER equal: `Int(1) != UInt(1)`
//! - `Bytes` are not `String`
//! - `Composite` keys compare element by element

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Keys produced by one secondary key extractor for one record.
///
/// Most indexes yield a single key per record ("field equals"), "contains"
/// indexes yield one key per element, so a small inline buffer covers the
/// common case without allocating.
pub type KeyList = SmallVec<[SecondaryKey; 4]>;

/// A derived, non-unique key grouping records inside a secondary index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecondaryKey {
    /// Boolean flag
    Bool(bool),
    /// Signed integer (all signed widths widen to i64)
    Int(i64),
    /// Unsigned integer (all unsigned widths widen to u64)
    UInt(u64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Ordered combination of keys, for multi-field indexes
    Composite(Vec<SecondaryKey>),
}

impl SecondaryKey {
    /// Get the variant name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            SecondaryKey::Bool(_) => "Bool",
            SecondaryKey::Int(_) => "Int",
            SecondaryKey::UInt(_) => "UInt",
            SecondaryKey::String(_) => "String",
            SecondaryKey::Bytes(_) => "Bytes",
            SecondaryKey::Composite(_) => "Composite",
        }
    }

    /// Get as str if this is a String key
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SecondaryKey::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int key
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SecondaryKey::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as u64 if this is a UInt key
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            SecondaryKey::UInt(u) => Some(*u),
            _ => None,
        }
    }

    /// Get the parts of a Composite key
    pub fn as_composite(&self) -> Option<&[SecondaryKey]> {
        match self {
            SecondaryKey::Composite(parts) => Some(parts),
            _ => None,
        }
    }
}

impl fmt::Display for SecondaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecondaryKey::Bool(b) => write!(f, "{}", b),
            SecondaryKey::Int(i) => write!(f, "{}", i),
            SecondaryKey::UInt(u) => write!(f, "{}", u),
            SecondaryKey::String(s) => write!(f, "{:?}", s),
            SecondaryKey::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            SecondaryKey::Composite(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", part)?;
                }
                write!(f, ")")
            }
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for SecondaryKey {
    fn from(b: bool) -> Self {
        SecondaryKey::Bool(b)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SecondaryKey {
                fn from(i: $t) -> Self {
                    SecondaryKey::Int(i as i64)
                }
            }
        )*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SecondaryKey {
                fn from(u: $t) -> Self {
                    SecondaryKey::UInt(u as u64)
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<char> for SecondaryKey {
    fn from(c: char) -> Self {
        SecondaryKey::String(c.to_string())
    }
}

impl From<&str> for SecondaryKey {
    fn from(s: &str) -> Self {
        SecondaryKey::String(s.to_string())
    }
}

impl From<String> for SecondaryKey {
    fn from(s: String) -> Self {
        SecondaryKey::String(s)
    }
}

impl From<&String> for SecondaryKey {
    fn from(s: &String) -> Self {
        SecondaryKey::String(s.clone())
    }
}

impl From<Vec<u8>> for SecondaryKey {
    fn from(b: Vec<u8>) -> Self {
        SecondaryKey::Bytes(b)
    }
}

impl From<&[u8]> for SecondaryKey {
    fn from(b: &[u8]) -> Self {
        SecondaryKey::Bytes(b.to_vec())
    }
}

impl<A, B> From<(A, B)> for SecondaryKey
where
    A: Into<SecondaryKey>,
    B: Into<SecondaryKey>,
{
    fn from((a, b): (A, B)) -> Self {
        SecondaryKey::Composite(vec![a.into(), b.into()])
    }
}

impl<A, B, C> From<(A, B, C)> for SecondaryKey
where
    A: Into<SecondaryKey>,
    B: Into<SecondaryKey>,
    C: Into<SecondaryKey>,
{
    fn from((a, b, c): (A, B, C)) -> Self {
        SecondaryKey::Composite(vec![a.into(), b.into(), c.into()])
    }
}
