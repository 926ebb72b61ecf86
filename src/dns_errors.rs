// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for record handling, PTR conversion, predicate configuration
//! and sync cycles.
//!
//! This module provides specialized error types for:
//! - Record payload validation (type/payload consistency, unsupported types)
//! - Address ↔ PTR name conversion
//! - Predicate (filter) configuration
//! - Startup configuration problems
//! - Joined per-adapter failures of a sync cycle
//!
//! Adapter code that talks to the network returns `anyhow::Result` with context;
//! the orchestrator tags those errors with the adapter identity and joins them
//! into a [`CycleError`].

use std::fmt;
use thiserror::Error;

/// Errors raised while converting between addresses and PTR names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PtrError {
    /// The name does not end in a known reverse-zone suffix
    #[error("PTR name '{name}' does not end in .in-addr.arpa. or .ip6.arpa.")]
    UnknownSuffix {
        /// The offending PTR name
        name: String,
    },

    /// The name has the wrong number of labels for its reverse zone
    #[error("PTR name '{name}' has {found} labels before the suffix, expected {expected}")]
    WrongLabelCount {
        /// The offending PTR name
        name: String,
        /// Labels required by the suffix (4 or 32)
        expected: usize,
        /// Labels actually present
        found: usize,
    },

    /// The labels reassemble into something that is not an address
    #[error("PTR name '{name}' does not encode a valid address: {reason}")]
    InvalidAddress {
        /// The offending PTR name
        name: String,
        /// Parser diagnostic
        reason: String,
    },
}

/// Errors raised while validating or mapping records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Record name is empty
    #[error("record name must not be empty")]
    EmptyName,

    /// Type tag is not one of A, AAAA, PTR, CNAME, SRV, MX
    #[error("unknown record type '{value}'")]
    UnknownType {
        /// The tag that was supplied
        value: String,
    },

    /// A payload field required by the record type is missing
    #[error("{record_type} record '{name}' is missing required field '{field}'")]
    MissingField {
        /// Record type tag
        record_type: String,
        /// Record name
        name: String,
        /// The field that must be set
        field: &'static str,
    },

    /// A payload field belonging to another record type is set
    #[error("{record_type} record '{name}' must not set field '{field}'")]
    UnexpectedField {
        /// Record type tag
        record_type: String,
        /// Record name
        name: String,
        /// The field that must not be set
        field: &'static str,
    },

    /// Address does not parse or belongs to the other address family
    #[error("{record_type} record '{name}' has invalid address '{address}'")]
    InvalidAddress {
        /// Record type tag
        record_type: String,
        /// Record name
        name: String,
        /// The supplied address text
        address: String,
    },

    /// Numeric field does not fit its wire type
    #[error("field '{field}' has invalid numeric value '{value}'")]
    InvalidNumber {
        /// Field name
        field: &'static str,
        /// The supplied text
        value: String,
    },

    /// The target system has no mapping for this record type
    #[error("record type {record_type} is not supported by {target}")]
    UnsupportedType {
        /// Record type tag
        record_type: String,
        /// The system that rejected it
        target: String,
    },
}

/// Errors raised while compiling a record predicate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Field name is not a record field
    #[error("unknown record field '{field}' in filter")]
    UnknownField {
        /// The field that was referenced
        field: String,
    },

    /// Operator needs at least one value
    #[error("operator {operator} on field '{field}' requires at least one value")]
    MissingValues {
        /// Field name
        field: String,
        /// Operator name
        operator: String,
    },

    /// Operator takes no values
    #[error("operator {operator} on field '{field}' does not take values")]
    UnexpectedValues {
        /// Field name
        field: String,
        /// Operator name
        operator: String,
    },

    /// Subnet value is not a CIDR prefix
    #[error("invalid subnet '{value}' in filter: {reason}")]
    InvalidSubnet {
        /// The supplied text
        value: String,
        /// Parser diagnostic
        reason: String,
    },
}

/// Errors raised while loading configuration, before the first cycle.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Sync interval is zero
    #[error("interval must be greater than zero")]
    ZeroInterval,

    /// Sync interval is not a valid duration
    #[error("invalid interval '{value}': {reason}")]
    InvalidInterval {
        /// The supplied text
        value: String,
        /// Parser diagnostic
        reason: String,
    },

    /// An HTTP-served sink is configured without a listen address
    #[error("sink '{sink}' requires http_listen_addr to be set")]
    MissingHttpListenAddr {
        /// Sink type tag
        sink: String,
    },

    /// Two HTTP-served sinks, or a sink and a built-in endpoint, claim one path
    #[error("HTTP path '{path}' is served by more than one handler")]
    RouteConflict {
        /// The contested path
        path: String,
    },

    /// An adapter option required by the chosen mode is missing
    #[error("{adapter}: field '{field}' is required")]
    MissingField {
        /// Adapter type tag
        adapter: String,
        /// The missing option
        field: &'static str,
    },

    /// A rewrite template failed to compile
    #[error("invalid rewrite template for field '{field}': {reason}")]
    InvalidTemplate {
        /// Rewritten field
        field: String,
        /// Template engine diagnostic
        reason: String,
    },

    /// The configuration document could not be read
    #[error("failed to read configuration {path}: {reason}")]
    Read {
        /// Configuration path
        path: String,
        /// IO diagnostic
        reason: String,
    },

    /// The configuration document could not be decoded
    #[error("failed to parse configuration {path}: {reason}")]
    Parse {
        /// Configuration path
        path: String,
        /// Decoder diagnostic
        reason: String,
    },
}

/// Phase of a sync cycle in which an adapter failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Source read
    Read,
    /// Modifier transform
    Transform,
    /// Sink write
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("source"),
            Self::Transform => f.write_str("modifier"),
            Self::Write => f.write_str("sink"),
        }
    }
}

/// One adapter failure within a cycle, tagged with the adapter identity.
#[derive(Error, Debug)]
#[error("{stage} {identity}: {error:#}")]
pub struct StageFailure {
    /// Phase in which the failure happened
    pub stage: Stage,
    /// `type.name` of the source, `type` of the modifier or sink
    pub identity: String,
    /// The underlying failure
    pub error: anyhow::Error,
}

/// Combined error of a cycle: every source, modifier and sink failure joined.
#[derive(Error, Debug)]
#[error("sync cycle failed: {}", join_failures(.failures))]
pub struct CycleError {
    /// Individual failures in the order they were collected
    pub failures: Vec<StageFailure>,
}

impl CycleError {
    /// Identities of the adapters that failed in `stage`.
    #[must_use]
    pub fn identities(&self, stage: Stage) -> Vec<&str> {
        self.failures
            .iter()
            .filter(|f| f.stage == stage)
            .map(|f| f.identity.as_str())
            .collect()
    }
}

fn join_failures(failures: &[StageFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Reconciliation batch in which some operations failed.
#[derive(Error, Debug)]
#[error("{failed} of {attempted} reconciliation operations failed: {}", .details.join("; "))]
pub struct ReconcileError {
    /// Number of failed operations
    pub failed: usize,
    /// Number of operations attempted
    pub attempted: usize,
    /// One line per failure
    pub details: Vec<String>,
}

#[cfg(test)]
#[path = "dns_errors_tests.rs"]
mod dns_errors_tests;
