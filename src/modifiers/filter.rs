// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use super::Modifier;
use crate::filter::RecordFilter;
use crate::record::Record;
use anyhow::Result;
use tracing::debug;

/// Keeps only the records passing a filter.
pub struct FilterModifier {
    filter: RecordFilter,
}

impl FilterModifier {
    #[must_use]
    pub fn new(filter: RecordFilter) -> Self {
        Self { filter }
    }
}

impl Modifier for FilterModifier {
    fn modifier_type(&self) -> &str {
        "filter"
    }

    fn modify(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        let before = records.len();
        let kept = self.filter.apply(records);
        debug!(modifier = "filter", dropped = before - kept.len(), kept = kept.len(), "Filter applied");
        Ok(kept)
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod filter_tests;
