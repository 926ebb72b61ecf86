// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! PTR synthesis.
//!
//! Every address record passing the filter gets a PTR record pointing back at
//! its name, unless its address is already covered by an existing PTR record or
//! by a PTR synthesised earlier in the same pass. Existing PTR names must parse
//! back into an address; a malformed one fails the whole invocation.

use super::Modifier;
use crate::constants::SOURCE_AUTOPTR;
use crate::filter::RecordFilter;
use crate::record::{Record, RecordData, RecordType};
use crate::reverse::{addr_to_ptr, ptr_to_addr};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::net::IpAddr;
use tracing::debug;

pub struct AutoPtrModifier {
    filter: RecordFilter,
}

impl AutoPtrModifier {
    #[must_use]
    pub fn new(filter: RecordFilter) -> Self {
        Self { filter }
    }
}

impl Modifier for AutoPtrModifier {
    fn modifier_type(&self) -> &str {
        SOURCE_AUTOPTR
    }

    fn modify(&self, mut records: Vec<Record>) -> Result<Vec<Record>> {
        let mut covered: HashSet<IpAddr> = HashSet::new();
        for rec in records.iter().filter(|r| r.record_type() == RecordType::PTR) {
            let addr = ptr_to_addr(&rec.name).with_context(|| format!("ptr to addr: {}", rec.name))?;
            covered.insert(addr);
        }

        let mut synthesized = Vec::new();
        for rec in &records {
            let Some(addr) = rec.address() else {
                continue;
            };
            if !self.filter.matches(rec) || !covered.insert(addr) {
                continue;
            }
            synthesized.push(
                Record::new(
                    &addr_to_ptr(addr),
                    RecordData::PTR {
                        ptr: rec.name.clone(),
                    },
                )
                .with_source(SOURCE_AUTOPTR, ""),
            );
        }

        debug!(modifier = SOURCE_AUTOPTR, synthesized = synthesized.len(), "PTR records synthesized");
        records.extend(synthesized);
        Ok(records)
    }
}

#[cfg(test)]
#[path = "autoptr_tests.rs"]
mod autoptr_tests;
