// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # dnsweave - periodic DNS record aggregation
//!
//! dnsweave collects DNS records from several inventories, reshapes them, and
//! publishes the result to several consumers on a fixed interval.
//!
//! ## Overview
//!
//! Each cycle:
//!
//! - reads every configured [`sources`] concurrently (files, HTTP documents,
//!   `RouterOS` DHCP leases, `NetBox` IP addresses, Traefik routers),
//! - runs the [`modifiers`] in order (filter, rewrite, PTR synthesis),
//! - hands the result to every [`sinks`] concurrently (an authoritative DNS
//!   responder, `RouterOS` static DNS, a JSON endpoint, an HTML dashboard),
//! - logs which records appeared and disappeared since the last good cycle.
//!
//! ## Modules
//!
//! - [`record`] - Record model and its flat serialized form
//! - [`filter`] - Record predicates (`accept` / `reject` selectors)
//! - [`reverse`] - Address ↔ PTR name conversion
//! - [`store`] - In-memory resolution store with CNAME chasing
//! - [`reconcile`] - Declarative diff-and-apply against external systems
//! - [`orchestrator`] - The periodic sync loop
//! - [`config`] - YAML configuration document
//! - [`rest`] - JSON-over-HTTP client with retries
//! - [`server`] - Metrics, health and sink routes over HTTP
//!
//! ## Example
//!
//! ```rust
//! use dnsweave::modifiers::{autoptr::AutoPtrModifier, Modifier};
//! use dnsweave::record::{Record, RecordData};
//!
//! let records = vec![Record::new("nas.lan", RecordData::A("10.0.0.7".parse().unwrap()))];
//! let with_ptr = AutoPtrModifier::new(Default::default()).modify(records).unwrap();
//! assert_eq!(with_ptr[1].name, "7.0.0.10.in-addr.arpa.");
//! ```

pub mod config;
pub mod constants;
pub mod dns_errors;
pub mod filter;
pub mod metrics;
pub mod modifiers;
pub mod orchestrator;
pub mod reconcile;
pub mod record;
pub mod rest;
pub mod reverse;
pub mod server;
pub mod sinks;
pub mod sources;
pub mod store;
