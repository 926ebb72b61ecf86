// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory resolution store backing the authoritative DNS responder.
//!
//! The store indexes the latest published snapshot by (name, type). Each write
//! builds a complete new index and swaps it in under the write lock, so a query
//! sees either the old snapshot or the new one, never a mix. Queries hold the
//! read lock for the whole answer, CNAME chase included.
//!
//! Names are matched case-insensitively with a trailing dot.
//!
//! # Example
//!
//! ```rust
//! use dnsweave::record::{Record, RecordData, RecordType};
//! use dnsweave::store::ResolutionStore;
//!
//! let store = ResolutionStore::new();
//! store.replace(&[
//!     Record::new("a.example.", RecordData::CNAME { target: "b.example.".into() }),
//!     Record::new("b.example.", RecordData::A("10.0.0.1".parse().unwrap())),
//! ]);
//!
//! let answers = store.answer("A.Example.", RecordType::A);
//! assert_eq!(answers.len(), 2);
//! ```

use crate::constants::MAX_CNAME_CHASE_DEPTH;
use crate::record::{normalize_name, Record, RecordData, RecordType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type Index = HashMap<String, HashMap<RecordType, Vec<Record>>>;

fn index_key(name: &str) -> String {
    normalize_name(name).to_ascii_lowercase()
}

/// One synthesized answer: the owner name as asked plus the record data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// Owner name of the answer (the question name, or the alias target while chasing)
    pub owner: String,
    pub data: RecordData,
}

/// Shared, cheaply clonable handle to the current snapshot.
#[derive(Debug, Clone, Default)]
pub struct ResolutionStore {
    index: Arc<RwLock<Index>>,
}

impl ResolutionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot with `records`.
    ///
    /// Insertion order is preserved per (name, type).
    pub fn replace(&self, records: &[Record]) {
        let mut next: Index = HashMap::new();
        for rec in records {
            next.entry(index_key(&rec.name))
                .or_default()
                .entry(rec.record_type())
                .or_default()
                .push(rec.clone());
        }

        let names = next.len();
        *self.index.write() = next;
        debug!(names, records = records.len(), "Resolution store rebuilt");
    }

    /// Number of records in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index
            .read()
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records stored at exactly (name, type), without alias chasing.
    #[must_use]
    pub fn lookup(&self, name: &str, rtype: RecordType) -> Vec<Record> {
        self.index
            .read()
            .get(&index_key(name))
            .and_then(|types| types.get(&rtype))
            .cloned()
            .unwrap_or_default()
    }

    /// Answers for a question, chasing CNAMEs for address queries.
    ///
    /// If the name has a CNAME and `qtype` is A or AAAA, the first CNAME is
    /// answered and the lookup continues at its target. Chains longer than
    /// [`MAX_CNAME_CHASE_DEPTH`] hops (loops included) yield no answers at all.
    #[must_use]
    pub fn answer(&self, qname: &str, qtype: RecordType) -> Vec<Answer> {
        let index = self.index.read();
        let mut answers = Vec::new();
        let mut owner = normalize_name(qname);

        for _ in 0..=MAX_CNAME_CHASE_DEPTH {
            let at_name = index.get(&index_key(&owner));

            let alias = at_name
                .and_then(|types| types.get(&RecordType::CNAME))
                .and_then(|cnames| cnames.first())
                .filter(|_| qtype.is_address());
            if let Some(alias) = alias {
                answers.push(Answer {
                    owner: owner.clone(),
                    data: alias.data.clone(),
                });
                if let RecordData::CNAME { target } = &alias.data {
                    owner = normalize_name(target);
                }
                continue;
            }

            if let Some(records) = at_name.and_then(|types| types.get(&qtype)) {
                answers.extend(records.iter().map(|rec| Answer {
                    owner: owner.clone(),
                    data: rec.data.clone(),
                }));
            }
            return answers;
        }

        debug!(qname, %qtype, depth = MAX_CNAME_CHASE_DEPTH, "CNAME chain too long, answering empty");
        Vec::new()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
