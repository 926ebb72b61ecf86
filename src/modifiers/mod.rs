// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pipeline stages applied between the sources and the sinks.
//!
//! Modifiers run one after another in configuration order, each on the full
//! output of the previous one. A modifier takes ownership of the record list and
//! returns the list for the next stage; an error aborts the cycle.

pub mod autoptr;
pub mod filter;
pub mod rewrite;

use crate::filter::RecordFilter;
use crate::record::Record;
use anyhow::Result;
use serde::Deserialize;

/// One transformation stage.
pub trait Modifier: Send + Sync {
    /// Type tag, e.g. `rewrite`.
    fn modifier_type(&self) -> &str;

    /// Transform the full record list.
    ///
    /// # Errors
    ///
    /// Any failure; the orchestrator aborts the cycle before the sinks are written.
    fn modify(&self, records: Vec<Record>) -> Result<Vec<Record>>;
}

/// Modifier configuration, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModifierConfig {
    Filter {
        #[serde(default)]
        filter: RecordFilter,
    },
    Rewrite(rewrite::RewriteConfig),
    Autoptr {
        #[serde(default)]
        filter: RecordFilter,
    },
}

impl ModifierConfig {
    /// Construct the modifier this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplate`](crate::dns_errors::ConfigError::InvalidTemplate)
    /// if a rewrite template does not compile.
    pub fn build(self) -> Result<Box<dyn Modifier>> {
        Ok(match self {
            Self::Filter { filter } => Box::new(filter::FilterModifier::new(filter)),
            Self::Rewrite(cfg) => Box::new(rewrite::RewriteModifier::new(cfg)?),
            Self::Autoptr { filter } => Box::new(autoptr::AutoPtrModifier::new(filter)),
        })
    }
}
