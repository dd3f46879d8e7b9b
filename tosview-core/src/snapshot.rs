//! File-backed memory reader
//!
//! A [`Snapshot`] holds a capture of the target's scalars and arrays, loaded
//! from JSON. It is immutable once built, so decoding it never tears.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, TargetAccessError};
use crate::target::{Element, Field, Fields, MemoryReader, Symbol};

/// Captured target state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    scalars: BTreeMap<Symbol, i64>,
    #[serde(default)]
    arrays: BTreeMap<Symbol, Vec<Fields>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from JSON text
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a snapshot file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json(&text)?;
        debug!(
            "Loaded snapshot {} ({} scalars, {} arrays)",
            path.display(),
            snapshot.scalars.len(),
            snapshot.arrays.len()
        );
        Ok(snapshot)
    }

    /// Set a scalar
    pub fn with_scalar(mut self, symbol: impl Into<Symbol>, value: i64) -> Self {
        self.scalars.insert(symbol.into(), value);
        self
    }

    /// Set an array of structs
    pub fn with_array(mut self, symbol: impl Into<Symbol>, elements: Vec<Fields>) -> Self {
        self.arrays.insert(symbol.into(), elements);
        self
    }

    /// Set an array of plain integers, exposed as elements with a single
    /// `value` field
    pub fn with_values(self, symbol: impl Into<Symbol>, values: &[i64]) -> Self {
        let elements = values
            .iter()
            .map(|v| fields(&[("value", *v)]))
            .collect();
        self.with_array(symbol, elements)
    }

    /// Overwrite one field of one element, creating neither
    pub fn set_field(&mut self, symbol: &Symbol, index: usize, name: &str, value: i64) -> bool {
        match self.arrays.get_mut(symbol).and_then(|a| a.get_mut(index)) {
            Some(elem) => {
                elem.insert(name.to_string(), Field::Int(value));
                true
            }
            None => false,
        }
    }

    fn array(&self, symbol: &Symbol) -> Result<&Vec<Fields>, TargetAccessError> {
        self.arrays.get(symbol).ok_or_else(|| {
            if self.scalars.contains_key(symbol) {
                TargetAccessError::NotAnArray {
                    symbol: symbol.to_string(),
                }
            } else {
                TargetAccessError::UnknownSymbol(symbol.to_string())
            }
        })
    }
}

impl MemoryReader for Snapshot {
    fn read_scalar(&self, symbol: &Symbol) -> Result<i64, TargetAccessError> {
        self.scalars
            .get(symbol)
            .copied()
            .ok_or_else(|| TargetAccessError::UnknownSymbol(symbol.to_string()))
    }

    fn read_array_element(&self, symbol: &Symbol, index: usize) -> Result<Element, TargetAccessError> {
        let array = self.array(symbol)?;
        let fields = array
            .get(index)
            .ok_or_else(|| TargetAccessError::IndexOutOfRange {
                symbol: symbol.to_string(),
                index,
                len: array.len(),
            })?;
        Ok(Element::new(symbol.clone(), index, fields.clone()))
    }

    fn array_length(&self, symbol: &Symbol) -> Result<usize, TargetAccessError> {
        Ok(self.array(symbol)?.len())
    }
}

/// Build a field set from integer pairs
pub fn fields(pairs: &[(&str, i64)]) -> Fields {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), Field::Int(*value)))
        .collect()
}
