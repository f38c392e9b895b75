//! Custom dimension and metric slots.

use crate::{ProtocolError, ProtocolResult};
use std::collections::BTreeMap;

/// Highest addressable custom dimension or metric index.
pub const MAX_CUSTOM_INDEX: u16 = 200;

/// Indexed custom dimensions (`cdN`) and metrics (`cmN`).
///
/// Slots are numbered from 1. Session-scoped slots are merged with
/// per-activity slots via [`CustomDimensions::merged_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomDimensions {
    dimensions: BTreeMap<u16, String>,
    metrics: BTreeMap<u16, i64>,
}

impl CustomDimensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_dimension(&mut self, index: u16, value: impl Into<String>) -> ProtocolResult<()> {
        check_index(index)?;
        self.dimensions.insert(index, value.into());
        Ok(())
    }

    pub fn set_metric(&mut self, index: u16, value: i64) -> ProtocolResult<()> {
        check_index(index)?;
        self.metrics.insert(index, value);
        Ok(())
    }

    pub fn remove_dimension(&mut self, index: u16) -> Option<String> {
        self.dimensions.remove(&index)
    }

    pub fn remove_metric(&mut self, index: u16) -> Option<i64> {
        self.metrics.remove(&index)
    }

    pub fn dimension(&self, index: u16) -> Option<&str> {
        self.dimensions.get(&index).map(String::as_str)
    }

    pub fn metric(&self, index: u16) -> Option<i64> {
        self.metrics.get(&index).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty() && self.metrics.is_empty()
    }

    /// Union of both sets; `other` wins where both define a slot.
    pub fn merged_with(&self, other: &CustomDimensions) -> CustomDimensions {
        let mut merged = self.clone();
        merged
            .dimensions
            .extend(other.dimensions.iter().map(|(k, v)| (*k, v.clone())));
        merged.metrics.extend(other.metrics.iter().map(|(k, v)| (*k, *v)));
        merged
    }

    /// Query parameters in slot order, dimensions first.
    pub fn query_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        let dimensions = self
            .dimensions
            .iter()
            .map(|(index, value)| (format!("cd{index}"), value.clone()));
        let metrics = self
            .metrics
            .iter()
            .map(|(index, value)| (format!("cm{index}"), value.to_string()));
        dimensions.chain(metrics)
    }
}

fn check_index(index: u16) -> ProtocolResult<()> {
    if (1..=MAX_CUSTOM_INDEX).contains(&index) {
        Ok(())
    } else {
        Err(ProtocolError::SlotOutOfRange(index))
    }
}
