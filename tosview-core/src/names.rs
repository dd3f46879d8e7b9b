//! Display names for task and timer ids

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Operator-supplied labels for one id space
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameOverrides {
    #[serde(default)]
    pub overrides: BTreeMap<u16, String>,
}

impl NameOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a label
    pub fn with(mut self, id: u16, label: impl Into<String>) -> Self {
        self.overrides.insert(id, label.into());
        self
    }

    pub fn insert(&mut self, id: u16, label: impl Into<String>) {
        self.overrides.insert(id, label.into());
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Maps ids to labels: `"<label>/<id>"` when overridden, `"t<id>"` otherwise
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    overrides: NameOverrides,
}

impl NameResolver {
    pub fn new(overrides: NameOverrides) -> Self {
        Self { overrides }
    }

    pub fn resolve(&self, id: u16) -> String {
        match self.overrides.overrides.get(&id) {
            Some(label) => format!("{}/{}", label, id),
            None => format!("t{}", id),
        }
    }
}
