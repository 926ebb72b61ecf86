// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record sources.
//!
//! A source produces the records it knows about for one cycle. Sources are read
//! concurrently by the orchestrator and must be safe to call repeatedly; none of
//! them keeps state between reads.
//!
//! The mapping from a configuration `type` tag to a concrete source lives in
//! [`SourceConfig::build`] and nowhere else.

pub mod file;
pub mod http;
pub mod mikrotik_dhcp;
pub mod netbox;
pub mod traefik;

use crate::config::duration_opt;
use crate::constants::DEFAULT_ADAPTER_TIMEOUT_SECS;
use crate::filter::RecordFilter;
use crate::record::Record;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A producer of records.
#[async_trait]
pub trait Source: Send + Sync {
    /// Type tag, e.g. `file` or `netbox`.
    fn source_type(&self) -> &str;

    /// Instance label, used to tell two sources of the same type apart.
    fn name(&self) -> &str;

    /// Upper bound for one [`read`](Source::read).
    fn timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_ADAPTER_TIMEOUT_SECS)
    }

    /// Produce this cycle's records.
    ///
    /// # Errors
    ///
    /// Any failure; the orchestrator isolates it from the other sources.
    async fn read(&self, token: &CancellationToken) -> Result<Vec<Record>>;
}

/// Settings shared by every source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceOptions {
    /// Instance label; each source falls back to its URL or path
    #[serde(default)]
    pub name: Option<String>,
    /// Per-read timeout (`"10s"`, `"1m"`)
    #[serde(default, with = "duration_opt")]
    pub timeout: Option<Duration>,
    /// Records not passing this filter are dropped at the source
    #[serde(default)]
    pub filter: RecordFilter,
}

impl SourceOptions {
    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
            .unwrap_or(Duration::from_secs(DEFAULT_ADAPTER_TIMEOUT_SECS))
    }

    pub(crate) fn name_or(&self, fallback: &str) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Source configuration, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    File(file::FileSourceConfig),
    Http(http::HttpSourceConfig),
    MikrotikDhcp(mikrotik_dhcp::MikrotikDhcpConfig),
    Netbox(netbox::NetboxConfig),
    Traefik(traefik::TraefikConfig),
}

impl SourceConfig {
    /// Construct the source this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter cannot be built (e.g. an unparsable URL).
    pub fn build(self) -> Result<Box<dyn Source>> {
        Ok(match self {
            Self::File(cfg) => Box::new(file::FileSource::new(cfg)),
            Self::Http(cfg) => Box::new(http::HttpSource::new(cfg)?),
            Self::MikrotikDhcp(cfg) => Box::new(mikrotik_dhcp::MikrotikDhcpSource::new(cfg)?),
            Self::Netbox(cfg) => Box::new(netbox::NetboxSource::new(cfg)?),
            Self::Traefik(cfg) => Box::new(traefik::TraefikSource::new(cfg)?),
        })
    }
}

/// Drop records that do not pass `filter`, logging each at debug level.
pub(crate) fn apply_filter(
    source_type: &str,
    source_name: &str,
    filter: &RecordFilter,
    records: Vec<Record>,
) -> Vec<Record> {
    records
        .into_iter()
        .filter(|rec| {
            let keep = filter.matches(rec);
            if !keep {
                debug!(source = source_type, source_name = source_name, record = %rec, "Filter drop");
            }
            keep
        })
        .collect()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
