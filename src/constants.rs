// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for dnsweave.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Provenance / Type Tags
// ============================================================================

/// Type tag of the file source
pub const SOURCE_FILE: &str = "file";

/// Type tag of the HTTP JSON source
pub const SOURCE_HTTP: &str = "http";

/// Type tag of the `MikroTik` DHCP lease source
pub const SOURCE_MIKROTIK_DHCP: &str = "mikrotik_dhcp";

/// Type tag of the `NetBox` IPAM source
pub const SOURCE_NETBOX: &str = "netbox";

/// Type tag of the Traefik router source
pub const SOURCE_TRAEFIK: &str = "traefik";

/// Provenance stamped on PTR records synthesized by the autoptr modifier
pub const SOURCE_AUTOPTR: &str = "autoptr";

/// Type tag of the authoritative DNS responder sink
pub const SINK_DNSSERVER: &str = "dnsserver";

/// Type tag of the `MikroTik` static DNS reconciling sink
pub const SINK_MIKROTIK: &str = "mikrotik";

/// Type tag of the JSON HTTP sink
pub const SINK_HTTP: &str = "http";

/// Type tag of the HTML dashboard sink
pub const SINK_DASHBOARD: &str = "dashboard";

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// TTL applied to every answer synthesized by the resolution store
pub const DEFAULT_ANSWER_TTL_SECS: u32 = 30;

/// Maximum number of CNAME hops followed while answering a single question
pub const MAX_CNAME_CHASE_DEPTH: usize = 8;

/// Largest UDP datagram accepted by the DNS responder
pub const MAX_UDP_DATAGRAM_SIZE: usize = 4096;

/// Reverse-zone suffix for IPv4 PTR names
pub const IPV4_REVERSE_SUFFIX: &str = ".in-addr.arpa.";

/// Reverse-zone suffix for IPv6 PTR names
pub const IPV6_REVERSE_SUFFIX: &str = ".ip6.arpa.";

/// Number of labels before the suffix in an IPv4 PTR name
pub const IPV4_PTR_LABELS: usize = 4;

/// Number of labels before the suffix in an IPv6 PTR name
pub const IPV6_PTR_LABELS: usize = 32;

// ============================================================================
// Adapter Defaults
// ============================================================================

/// Default per-call timeout for sources and sinks (seconds)
pub const DEFAULT_ADAPTER_TIMEOUT_SECS: u64 = 10;

/// Default TTL written to `MikroTik` static DNS entries
pub const DEFAULT_MIKROTIK_TTL: &str = "1d";

/// Default ownership marker written into the comment of `MikroTik` entries
pub const DEFAULT_OWNERSHIP_MARKER: &str = "managed-by-dnsweave";

/// Page size requested from `NetBox` list endpoints
pub const NETBOX_PAGE_SIZE: usize = 100;

/// Default path for the JSON HTTP sink
pub const DEFAULT_HTTP_SINK_PATH: &str = "/records";

/// Path of the Prometheus scrape endpoint
pub const METRICS_PATH: &str = "/metrics";

/// Path of the liveness endpoint
pub const HEALTH_PATH: &str = "/healthz";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of tokio worker threads in the binary
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
