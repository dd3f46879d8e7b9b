//! Target memory access
//!
//! The decoders never talk to a debugger directly. They go through the
//! [`MemoryReader`] trait, which exposes the three primitives needed to walk
//! the scheduler and timer state:
//!
//! - named scalars (`nxt_tt`, `m_head`, tag enum constants, ...)
//! - elements of named arrays, as a set of named, typed fields
//! - array lengths
//!
//! Each call is treated as atomic. Nothing is atomic across calls: the target
//! keeps running between reads, so a sequence of reads may observe a torn
//! state.
//!
//! # Implementing a reader
//!
//! ```ignore
//! struct GdbReader { /* connection */ }
//!
//! impl MemoryReader for GdbReader {
//!     fn read_scalar(&self, symbol: &Symbol) -> Result<i64, TargetAccessError> {
//!         // evaluate the symbol on the target
//!     }
//!     // ...
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::TargetAccessError;

// ============================================================================
// Symbols
// ============================================================================

/// Opaque key naming a scalar or array on the target
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Typed fields
// ============================================================================

/// Byte order of a raw field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// A struct field as read from the target
///
/// Either an integer the reader already decoded, or the raw target bytes
/// together with the field's signedness and byte order. The width is the
/// length of `bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Int(i64),
    Bool(bool),
    Raw {
        bytes: Vec<u8>,
        #[serde(default)]
        signed: bool,
        #[serde(default)]
        endian: Endian,
    },
}

impl Field {
    /// Decode to an integer, sign-extending signed raw fields
    pub fn decode(&self, name: &str) -> Result<i64, TargetAccessError> {
        match self {
            Field::Int(v) => Ok(*v),
            Field::Bool(b) => Ok(i64::from(*b)),
            Field::Raw { bytes, signed, endian } => decode_raw(name, bytes, *signed, *endian),
        }
    }
}

fn decode_raw(name: &str, bytes: &[u8], signed: bool, endian: Endian) -> Result<i64, TargetAccessError> {
    let width = bytes.len();
    if !matches!(width, 1 | 2 | 4 | 8) {
        return Err(TargetAccessError::BadWidth {
            field: name.to_string(),
            width,
        });
    }

    // Widen to 8 bytes in big-endian order, then sign-extend from the top
    // bit of the original width.
    let mut be = [0u8; 8];
    match endian {
        Endian::Big => be[8 - width..].copy_from_slice(bytes),
        Endian::Little => {
            for (i, b) in bytes.iter().enumerate() {
                be[7 - i] = *b;
            }
        }
    }
    let unsigned = u64::from_be_bytes(be);

    if signed {
        let shift = 64 - 8 * width as u32;
        Ok(((unsigned << shift) as i64) >> shift)
    } else if width == 8 {
        i64::try_from(unsigned).map_err(|_| TargetAccessError::ValueOutOfRange {
            what: name.to_string(),
            value: unsigned as i64,
            ty: "i64",
        })
    } else {
        Ok(unsigned as i64)
    }
}

/// Named fields of one array element
pub type Fields = BTreeMap<String, Field>;

/// One element of a target array, with the context needed for error reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    symbol: Symbol,
    index: usize,
    fields: Fields,
}

impl Element {
    pub fn new(symbol: Symbol, index: usize, fields: Fields) -> Self {
        Self { symbol, index, fields }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Read a field as a signed 64-bit integer
    pub fn get(&self, name: &str) -> Result<i64, TargetAccessError> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| TargetAccessError::MissingField {
                symbol: self.symbol.to_string(),
                index: self.index,
                field: name.to_string(),
            })?;
        field.decode(name)
    }

    /// Read a field and narrow it to `T`
    pub fn get_as<T: TryFrom<i64>>(&self, name: &str) -> Result<T, TargetAccessError> {
        let value = self.get(name)?;
        let what = format!("{}[{}].{}", self.symbol, self.index, name);
        narrow(&what, value)
    }

    /// Read a field as a flag (any non-zero value is true)
    pub fn get_flag(&self, name: &str) -> Result<bool, TargetAccessError> {
        Ok(self.get(name)? != 0)
    }
}

/// Narrow a target integer into the type a decoder works with
pub fn narrow<T: TryFrom<i64>>(what: &str, value: i64) -> Result<T, TargetAccessError> {
    T::try_from(value).map_err(|_| TargetAccessError::ValueOutOfRange {
        what: what.to_string(),
        value,
        ty: std::any::type_name::<T>(),
    })
}

// ============================================================================
// Reader trait
// ============================================================================

/// Read-only access to the inspected target
pub trait MemoryReader {
    /// Read a named integer scalar or enum constant
    fn read_scalar(&self, symbol: &Symbol) -> Result<i64, TargetAccessError>;

    /// Read one element of a named array
    fn read_array_element(&self, symbol: &Symbol, index: usize) -> Result<Element, TargetAccessError>;

    /// Number of elements in a named array
    fn array_length(&self, symbol: &Symbol) -> Result<usize, TargetAccessError>;
}

/// Read a scalar through a trait object and narrow it to `T`
pub fn read_scalar_as<T: TryFrom<i64>>(
    reader: &dyn MemoryReader,
    symbol: &Symbol,
) -> Result<T, TargetAccessError> {
    let value = reader.read_scalar(symbol)?;
    narrow(symbol.as_str(), value)
}
