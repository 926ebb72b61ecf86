// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record sinks.
//!
//! Every sink receives the full published set each cycle and replaces whatever
//! it held before. Sinks are written concurrently and never depend on each other.
//!
//! Some sinks also need something running next to the orchestrator: the
//! `dnsserver` sink answers queries on a UDP socket, and the `http` and
//! `dashboard` sinks serve routes on the shared HTTP server. [`build_sinks`]
//! returns those pieces alongside the sinks so the binary can start them.

pub mod dashboard;
pub mod dnsserver;
pub mod http;
pub mod mikrotik;

use crate::constants::{DEFAULT_ADAPTER_TIMEOUT_SECS, SINK_DASHBOARD, SINK_HTTP};
use crate::record::Record;
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::Router;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A consumer of the published record set.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Type tag, e.g. `dnsserver`.
    fn sink_type(&self) -> &str;

    /// Upper bound for one [`write`](Sink::write).
    fn timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_ADAPTER_TIMEOUT_SECS)
    }

    /// Replace the sink's contents with `records`.
    ///
    /// # Errors
    ///
    /// Any failure; the orchestrator isolates it from the other sinks.
    async fn write(&self, records: &[Record], token: &CancellationToken) -> Result<()>;
}

/// Sink configuration, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Dnsserver(dnsserver::DnsServerConfig),
    Mikrotik(mikrotik::MikrotikSinkConfig),
    Http(http::HttpSinkConfig),
    Dashboard(dashboard::DashboardConfig),
}

impl SinkConfig {
    /// Type tag of the configured sink.
    #[must_use]
    pub fn sink_type(&self) -> &'static str {
        match self {
            Self::Dnsserver(_) => crate::constants::SINK_DNSSERVER,
            Self::Mikrotik(_) => crate::constants::SINK_MIKROTIK,
            Self::Http(_) => SINK_HTTP,
            Self::Dashboard(_) => SINK_DASHBOARD,
        }
    }

    /// Whether the sink serves routes on the HTTP server.
    #[must_use]
    pub fn needs_http(&self) -> bool {
        self.http_path().is_some()
    }

    /// Path the sink serves on the HTTP server, if any.
    #[must_use]
    pub fn http_path(&self) -> Option<String> {
        match self {
            Self::Http(cfg) => Some(http::route_path(&cfg.path)),
            Self::Dashboard(_) => Some("/".to_string()),
            Self::Dnsserver(_) | Self::Mikrotik(_) => None,
        }
    }
}

/// Everything the configured sinks need to run.
#[derive(Default)]
pub struct SinkSet {
    /// Sinks handed to the orchestrator
    pub sinks: Vec<Box<dyn Sink>>,
    /// Routes served by the HTTP server
    pub router: Router,
    /// Bound DNS responders, not yet serving
    pub responders: Vec<dnsserver::DnsResponder>,
}

/// Construct every configured sink, binding sockets as needed.
///
/// # Errors
///
/// Returns an error if a DNS listen address cannot be bound or an adapter cannot
/// be built.
pub async fn build_sinks(configs: Vec<SinkConfig>) -> Result<SinkSet> {
    let mut set = SinkSet::default();
    for cfg in configs {
        let kind = cfg.sink_type();
        match cfg {
            SinkConfig::Dnsserver(cfg) => {
                let (sink, responder) = dnsserver::DnsServerSink::bind(cfg)
                    .await
                    .with_context(|| format!("{kind} sink"))?;
                set.sinks.push(Box::new(sink));
                set.responders.push(responder);
            }
            SinkConfig::Mikrotik(cfg) => {
                let sink = mikrotik::MikrotikSink::new(cfg).with_context(|| format!("{kind} sink"))?;
                set.sinks.push(Box::new(sink));
            }
            SinkConfig::Http(cfg) => {
                let sink = http::HttpSink::new(cfg);
                set.router = set.router.merge(sink.routes());
                set.sinks.push(Box::new(sink));
            }
            SinkConfig::Dashboard(cfg) => {
                let sink = dashboard::DashboardSink::new(cfg)?;
                set.router = set.router.merge(sink.routes());
                set.sinks.push(Box::new(sink));
            }
        }
    }
    Ok(set)
}
