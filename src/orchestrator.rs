// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The periodic sync engine.
//!
//! # Architecture
//!
//! Every tick runs one cycle:
//!
//! 1. **Read**: all sources are called concurrently, each under its own timeout and
//!    the cycle's cancellation token. A failing source is recorded and skipped; the
//!    others' records are concatenated in configuration order.
//! 2. **Transform**: modifiers run strictly in configuration order, each on the full
//!    output of the previous one. A modifier error aborts the cycle before any sink
//!    is written, so sinks keep the last good set.
//! 3. **Write**: all sinks receive the same immutable record set concurrently. A
//!    failing sink does not affect the others.
//! 4. **Diff**: when no source or sink failed, the set is compared with the
//!    previous published set and the additions and removals are logged. Only then
//!    does the new set become the baseline.
//!
//! Failures from every phase are joined into one [`CycleError`] that is logged after
//! the cycle; nothing short of cancellation stops the loop. Ticks never overlap: a
//! slow cycle delays the next tick.

use crate::dns_errors::{ConfigError, CycleError, Stage, StageFailure};
use crate::metrics;
use crate::modifiers::Modifier;
use crate::record::Record;
use crate::sinks::Sink;
use crate::sources::Source;
use anyhow::{anyhow, Result};
use futures::future::join_all;
use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Records that appeared or disappeared between two published sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<Record>,
    pub removed: Vec<Record>,
}

impl ChangeSet {
    /// Compare `current` against `previous`. Both lists come back sorted by name and type.
    #[must_use]
    pub fn between(previous: &HashSet<Record>, current: &HashSet<Record>) -> Self {
        let mut added: Vec<Record> = current.difference(previous).cloned().collect();
        let mut removed: Vec<Record> = previous.difference(current).cloned().collect();
        added.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        removed.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { added, removed }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// What one cycle did.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Set handed to the sinks; `None` when the cycle aborted before writing
    pub published: Option<Vec<Record>>,
    /// Changes against the previous baseline; `None` when the baseline did not move
    pub changes: Option<ChangeSet>,
    /// Every failure of the cycle, joined
    pub error: Option<CycleError>,
}

/// Owns the adapters and the change-detection baseline.
pub struct Orchestrator {
    interval: Duration,
    sources: Vec<Box<dyn Source>>,
    modifiers: Vec<Box<dyn Modifier>>,
    sinks: Vec<Box<dyn Sink>>,
    previous: HashSet<Record>,
}

impl Orchestrator {
    /// Build an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroInterval`] if `interval` is zero.
    pub fn new(
        interval: Duration,
        sources: Vec<Box<dyn Source>>,
        modifiers: Vec<Box<dyn Modifier>>,
        sinks: Vec<Box<dyn Sink>>,
    ) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(Self {
            interval,
            sources,
            modifiers,
            sinks,
            previous: HashSet::new(),
        })
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a cycle on every tick until `token` is cancelled.
    pub async fn run(mut self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval = ?self.interval,
            sources = self.sources.len(),
            modifiers = self.modifiers.len(),
            sinks = self.sinks.len(),
            "Starting sync loop"
        );

        loop {
            tokio::select! {
                () = token.cancelled() => {
                    info!("Sync loop stopped");
                    return;
                }
                _ = ticker.tick() => {}
            }

            let report = self.run_cycle(&token).await;
            if let Some(err) = report.error {
                error!(error = %err, "Sync cycle finished with errors");
            }
        }
    }

    /// Execute exactly one read → transform → write → diff pass.
    pub async fn run_cycle(&mut self, token: &CancellationToken) -> CycleReport {
        let started = Instant::now();
        debug!("Starting sync cycle");

        let (mut records, mut failures) = self.read_sources(token).await;

        for modifier in &self.modifiers {
            let kind = modifier.modifier_type().to_string();
            match modifier.modify(records) {
                Ok(next) => {
                    debug!(modifier = %kind, records = next.len(), "Modifier applied");
                    records = next;
                }
                Err(e) => {
                    metrics::record_adapter_failure("modifier", &kind);
                    failures.push(StageFailure {
                        stage: Stage::Transform,
                        identity: kind,
                        error: e,
                    });
                    metrics::record_cycle_error(started.elapsed());
                    return CycleReport {
                        published: None,
                        changes: None,
                        error: Some(CycleError { failures }),
                    };
                }
            }
        }

        let write_failures = self.write_sinks(&records, token).await;
        failures.extend(write_failures);

        let changes = if failures.is_empty() {
            let current: HashSet<Record> = records.iter().cloned().collect();
            let changes = ChangeSet::between(&self.previous, &current);
            for rec in &changes.removed {
                info!(record = %rec, source = %rec.source, "Record removed");
            }
            for rec in &changes.added {
                info!(record = %rec, source = %rec.source, "Record added");
            }
            metrics::record_published(records.len(), changes.added.len(), changes.removed.len());
            self.previous = current;
            Some(changes)
        } else {
            warn!(failures = failures.len(), "Not advancing change baseline after cycle failures");
            None
        };

        let elapsed = started.elapsed();
        if failures.is_empty() {
            metrics::record_cycle_success(elapsed);
            debug!(records = records.len(), elapsed = ?elapsed, "Sync cycle complete");
        } else {
            metrics::record_cycle_partial(elapsed);
        }

        CycleReport {
            published: Some(records),
            changes,
            error: (!failures.is_empty()).then_some(CycleError { failures }),
        }
    }

    /// Read every source concurrently.
    ///
    /// Returns the concatenated records of the sources that succeeded, in
    /// configuration order, and one failure per source that did not.
    pub async fn read_sources(&self, token: &CancellationToken) -> (Vec<Record>, Vec<StageFailure>) {
        let reads = self.sources.iter().map(|source| async move {
            let identity = source_identity(source.as_ref());
            let result = guarded(source.timeout(), token, source.read(token)).await;
            (identity, result)
        });

        let mut records = Vec::new();
        let mut failures = Vec::new();
        for (identity, result) in join_all(reads).await {
            match result {
                Ok(batch) => {
                    debug!(source = %identity, records = batch.len(), "Source read");
                    records.extend(batch);
                }
                Err(e) => {
                    warn!(source = %identity, error = %format!("{e:#}"), "Source read failed");
                    metrics::record_adapter_failure("source", &identity);
                    failures.push(StageFailure {
                        stage: Stage::Read,
                        identity,
                        error: e,
                    });
                }
            }
        }
        (records, failures)
    }

    async fn write_sinks(&self, records: &[Record], token: &CancellationToken) -> Vec<StageFailure> {
        let writes = self.sinks.iter().map(|sink| async move {
            let identity = sink.sink_type().to_string();
            let result = guarded(sink.timeout(), token, sink.write(records, token)).await;
            (identity, result)
        });

        let mut failures = Vec::new();
        for (identity, result) in join_all(writes).await {
            if let Err(e) = result {
                warn!(sink = %identity, error = %format!("{e:#}"), "Sink write failed");
                metrics::record_adapter_failure("sink", &identity);
                failures.push(StageFailure {
                    stage: Stage::Write,
                    identity,
                    error: e,
                });
            }
        }
        failures
    }
}

/// `type.name` of a source, or just `type` when it has no instance label.
fn source_identity(source: &dyn Source) -> String {
    if source.name().is_empty() {
        source.source_type().to_string()
    } else {
        format!("{}.{}", source.source_type(), source.name())
    }
}

/// Await `call` unless the timeout or the cancellation token fires first.
async fn guarded<T, F>(timeout: Duration, token: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        () = token.cancelled() => Err(anyhow!("cancelled")),
        result = tokio::time::timeout(timeout, call) => match result {
            Ok(inner) => inner,
            Err(_) => Err(anyhow!("timed out after {}", humantime::format_duration(timeout))),
        },
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod orchestrator_tests;
