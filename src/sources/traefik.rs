// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Records for the hosts routed by a Traefik instance.
//!
//! Every ``Host(`...`)`` matcher of every HTTP router is turned into either
//! address records (`mode: address`) or CNAME records (`mode: cname`).
//!
//! In address mode the configured `addresses` are used when set, otherwise the
//! bind address of each entrypoint the router listens on. Entrypoints bound to a
//! wildcard host (`:443`) have no usable address and contribute nothing.

use super::{apply_filter, Source, SourceOptions};
use crate::constants::SOURCE_TRAEFIK;
use crate::dns_errors::ConfigError;
use crate::record::{normalize_name, Record, RecordData};
use crate::rest::{Auth, RestClient};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const ROUTERS_PATH: &str = "/api/http/routers";
const ENTRYPOINTS_PATH: &str = "/api/entrypoints";
const HOST_MATCHER: &str = "Host(";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraefikMode {
    #[default]
    Address,
    Cname,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraefikConfig {
    pub url: String,
    #[serde(default)]
    pub mode: TraefikMode,
    /// Only routers on these entrypoints are considered; empty means all
    #[serde(default)]
    pub entrypoints: Vec<String>,
    /// Fixed addresses for address mode
    #[serde(default)]
    pub addresses: Vec<IpAddr>,
    /// Alias target for cname mode
    #[serde(default)]
    pub target: Option<String>,
    #[serde(flatten)]
    pub options: SourceOptions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Router {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "entryPoints", default)]
    pub entry_points: Vec<String>,
    #[serde(default)]
    pub rule: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entrypoint {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

/// Host names named by every `Host(...)` matcher in a router rule.
#[must_use]
pub fn router_hosts(rule: &str) -> Vec<String> {
    let mut hosts = Vec::new();
    let mut rest = rule;
    while let Some(start) = rest.find(HOST_MATCHER) {
        let preceded_by_ident = rest[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric());
        rest = &rest[start + HOST_MATCHER.len()..];
        let Some(end) = rest.find(')') else {
            break;
        };
        if !preceded_by_ident {
            hosts.extend(
                rest[..end]
                    .split(',')
                    .map(|arg| arg.trim().trim_matches(|c| matches!(c, '`' | '"' | '\'')))
                    .filter(|host| !host.is_empty())
                    .map(str::to_string),
            );
        }
        rest = &rest[end..];
    }
    hosts
}

pub struct TraefikSource {
    name: String,
    cfg: TraefikConfig,
    target: String,
    client: RestClient,
}

impl TraefikSource {
    /// # Errors
    ///
    /// Returns an error if `url` is invalid or cname mode has no `target`.
    pub fn new(cfg: TraefikConfig) -> Result<Self> {
        let target = match (cfg.mode, cfg.target.as_deref()) {
            (TraefikMode::Cname, None | Some("")) => {
                return Err(ConfigError::MissingField {
                    adapter: SOURCE_TRAEFIK.to_string(),
                    field: "target",
                }
                .into())
            }
            (_, target) => target.map(normalize_name).unwrap_or_default(),
        };
        let client = RestClient::new(&cfg.url, Auth::None, cfg.options.timeout())?;
        Ok(Self {
            name: cfg.options.name_or(&cfg.url),
            cfg,
            target,
            client,
        })
    }

    fn entrypoint_allowed(&self, entrypoint: &str) -> bool {
        self.cfg.entrypoints.is_empty() || self.cfg.entrypoints.iter().any(|e| e == entrypoint)
    }

    async fn read_address(&self) -> Result<Vec<Record>> {
        let entrypoints: Vec<Entrypoint> = self.client.get(ENTRYPOINTS_PATH).await?;
        let routers: Vec<Router> = self.client.get(ROUTERS_PATH).await?;

        let bound: HashMap<String, IpAddr> = entrypoints
            .iter()
            .filter_map(|ep| match ep.address.parse::<SocketAddr>() {
                Ok(sock) => Some((ep.name.clone(), sock.ip())),
                Err(_) => {
                    debug!(entrypoint = %ep.name, address = %ep.address, "Entrypoint has no bind address");
                    None
                }
            })
            .collect();

        let mut records = Vec::new();
        for router in &routers {
            for host in router_hosts(&router.rule) {
                for ep in router.entry_points.iter().filter(|ep| self.entrypoint_allowed(ep)) {
                    let addrs: Vec<IpAddr> = if self.cfg.addresses.is_empty() {
                        bound.get(ep).copied().into_iter().collect()
                    } else {
                        self.cfg.addresses.clone()
                    };
                    records.extend(addrs.into_iter().map(|addr| {
                        Record::new(&host, RecordData::from_ip(addr))
                            .with_source(SOURCE_TRAEFIK, &self.name)
                    }));
                }
            }
        }
        Ok(records)
    }

    async fn read_cname(&self) -> Result<Vec<Record>> {
        let routers: Vec<Router> = self.client.get(ROUTERS_PATH).await?;

        let records = routers
            .iter()
            .filter(|router| router.entry_points.iter().any(|ep| self.entrypoint_allowed(ep)))
            .flat_map(|router| router_hosts(&router.rule))
            .map(|host| {
                Record::new(
                    &host,
                    RecordData::CNAME {
                        target: self.target.clone(),
                    },
                )
                .with_source(SOURCE_TRAEFIK, &self.name)
            })
            .collect();
        Ok(records)
    }
}

#[async_trait]
impl Source for TraefikSource {
    fn source_type(&self) -> &str {
        SOURCE_TRAEFIK
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.cfg.options.timeout()
    }

    async fn read(&self, _token: &CancellationToken) -> Result<Vec<Record>> {
        let mut records = match self.cfg.mode {
            TraefikMode::Address => self.read_address().await?,
            TraefikMode::Cname => self.read_cname().await?,
        };

        let mut seen = HashSet::new();
        records.retain(|rec| seen.insert(rec.clone()));

        Ok(apply_filter(SOURCE_TRAEFIK, &self.name, &self.cfg.options.filter, records))
    }
}

#[cfg(test)]
#[path = "traefik_tests.rs"]
mod traefik_tests;
