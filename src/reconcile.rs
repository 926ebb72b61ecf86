// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Declarative synchronization of a desired record set against an external system.
//!
//! # Architecture
//!
//! Reconciliation follows the observe → diff → act loop:
//!
//! 1. **Desired**: the cycle's records, narrowed to the types the target can represent
//!    ([`ReconcileTarget::supports`]). A type the target cannot map at all is an error.
//!    Records the target would store as the same entry
//!    ([`ReconcileTarget::same_desired`]) collapse to the first one, so a host reported
//!    by two sources is added once.
//! 2. **Observed**: every entry the target reports, narrowed to entries carrying this
//!    system's ownership marker ([`ReconcileTarget::is_owned`]). Foreign entries are
//!    never matched, added or removed.
//! 3. **Diff**: [`reconcile`] pairs desired records with observed entries using the
//!    target's equivalence ([`ReconcileTarget::matches`]) and yields what to add and
//!    what to remove. It is pure, so the same inputs always give the same plan.
//! 4. **Act**: [`sync`] attempts every removal, then every addition. One failed
//!    operation does not stop the others; failures are reported together and the
//!    next cycle recomputes the diff from fresh state.
//!
//! The diff is a double scan over both sets, which is fine for the tens to low
//! hundreds of entries a home or lab network carries.

use crate::dns_errors::{RecordError, ReconcileError};
use crate::metrics;
use crate::record::Record;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, info, warn};

/// Minimal set of changes that makes the observed side equal the desired side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan<D, O> {
    /// Desired items with no equivalent observed entry
    pub to_add: Vec<D>,
    /// Observed entries with no equivalent desired item
    pub to_remove: Vec<O>,
}

impl<D, O> Plan<D, O> {
    /// Whether the two sides already agree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the add/remove plan between `desired` and `observed`.
///
/// `same` decides whether a desired item and an observed entry describe the same
/// thing. Input order is preserved in both output lists.
pub fn reconcile<D, O, F>(desired: &[D], observed: &[O], same: F) -> Plan<D, O>
where
    D: Clone,
    O: Clone,
    F: Fn(&D, &O) -> bool,
{
    let to_add = desired
        .iter()
        .filter(|d| !observed.iter().any(|o| same(d, o)))
        .cloned()
        .collect();
    let to_remove = observed
        .iter()
        .filter(|o| !desired.iter().any(|d| same(d, o)))
        .cloned()
        .collect();
    Plan { to_add, to_remove }
}

/// An external system kept in sync with the published record set.
///
/// The three I/O operations must be idempotent enough to be retried on the next
/// cycle; the reconciler itself does not care how they are transported.
#[async_trait]
pub trait ReconcileTarget: Send + Sync {
    /// Entry as the external system represents it.
    type Entry: Clone + fmt::Debug + Send + Sync;

    /// Short name used in logs, metrics and errors.
    fn target_name(&self) -> &str;

    /// Whether `rec` belongs in the desired set.
    ///
    /// `Ok(false)` silently drops the record (its type has no representation).
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnsupportedType`] for types that must be mapped but cannot be.
    fn supports(&self, rec: &Record) -> Result<bool, RecordError>;

    /// Whether `entry` carries this system's ownership marker.
    fn is_owned(&self, entry: &Self::Entry) -> bool;

    /// Equivalence between a desired record and an observed entry.
    fn matches(&self, rec: &Record, entry: &Self::Entry) -> bool;

    /// Whether two desired records would become the same entry. Provenance is ignored.
    fn same_desired(&self, a: &Record, b: &Record) -> bool {
        a.name.eq_ignore_ascii_case(&b.name) && a.data == b.data
    }

    /// Read every entry currently present.
    async fn list(&self) -> Result<Vec<Self::Entry>>;

    /// Create an entry for `rec`, stamped with the ownership marker.
    async fn add(&self, rec: &Record) -> Result<()>;

    /// Delete `entry`.
    async fn remove(&self, entry: &Self::Entry) -> Result<()>;
}

/// Outcome of a successful [`sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub added: usize,
    pub removed: usize,
}

/// Observe the target, diff against `records`, and apply the plan.
///
/// # Errors
///
/// - [`RecordError::UnsupportedType`] if a record cannot be mapped (nothing is applied)
/// - the listing error if the target cannot be read (nothing is applied)
/// - [`ReconcileError`] if any individual add or remove failed (all others were attempted)
pub async fn sync<T: ReconcileTarget>(target: &T, records: &[Record]) -> Result<SyncSummary> {
    let mut desired: Vec<Record> = Vec::with_capacity(records.len());
    for rec in records {
        if !target.supports(rec)? {
            debug!(system = target.target_name(), record = %rec, "Record type not representable, skipping");
        } else if desired.iter().any(|d| target.same_desired(d, rec)) {
            debug!(system = target.target_name(), record = %rec, source = %rec.source, "Duplicate desired record, skipping");
        } else {
            desired.push(rec.clone());
        }
    }

    let observed: Vec<T::Entry> = target
        .list()
        .await?
        .into_iter()
        .filter(|e| target.is_owned(e))
        .collect();

    let plan = reconcile(&desired, &observed, |rec, entry| target.matches(rec, entry));
    if plan.is_empty() {
        debug!(
            system = target.target_name(),
            desired = desired.len(),
            observed = observed.len(),
            "Target already in sync"
        );
        return Ok(SyncSummary::default());
    }

    let attempted = plan.to_add.len() + plan.to_remove.len();
    let mut details = Vec::new();
    let mut summary = SyncSummary::default();

    for entry in &plan.to_remove {
        match target.remove(entry).await {
            Ok(()) => {
                info!(system = target.target_name(), entry = ?entry, "Removed entry");
                metrics::record_reconcile_operation(target.target_name(), "remove", true);
                summary.removed += 1;
            }
            Err(e) => {
                warn!(system = target.target_name(), entry = ?entry, error = %e, "Failed to remove entry");
                metrics::record_reconcile_operation(target.target_name(), "remove", false);
                details.push(format!("remove {entry:?}: {e:#}"));
            }
        }
    }

    for rec in &plan.to_add {
        match target.add(rec).await {
            Ok(()) => {
                info!(system = target.target_name(), record = %rec, "Added entry");
                metrics::record_reconcile_operation(target.target_name(), "add", true);
                summary.added += 1;
            }
            Err(e) => {
                warn!(system = target.target_name(), record = %rec, error = %e, "Failed to add entry");
                metrics::record_reconcile_operation(target.target_name(), "add", false);
                details.push(format!("add {rec}: {e:#}"));
            }
        }
    }

    if details.is_empty() {
        Ok(summary)
    } else {
        Err(ReconcileError {
            failed: details.len(),
            attempted,
            details,
        }
        .into())
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod reconcile_tests;
