// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Address records from `RouterOS` DHCP leases.
//!
//! Every lease whose comment is non-empty becomes an A or AAAA record named after
//! the comment. The active address wins over the configured static address.

use super::{apply_filter, Source, SourceOptions};
use crate::constants::SOURCE_MIKROTIK_DHCP;
use crate::record::{Record, RecordData};
use crate::rest::{Auth, RestClient};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const LEASES_PATH: &str = "/rest/ip/dhcp-server/lease";

#[derive(Debug, Clone, Deserialize)]
pub struct MikrotikDhcpConfig {
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(flatten)]
    pub options: SourceOptions,
}

/// The subset of a lease this source needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lease {
    #[serde(rename = ".id", default)]
    pub id: String,
    #[serde(default)]
    pub address: String,
    #[serde(rename = "active-address", default)]
    pub active_address: String,
    #[serde(rename = "mac-address", default)]
    pub mac_address: String,
    #[serde(default)]
    pub comment: String,
}

impl Lease {
    fn to_record(&self, source_name: &str) -> Result<Option<Record>> {
        let name = self.comment.trim();
        if name.is_empty() {
            return Ok(None);
        }
        let text = if self.active_address.is_empty() {
            &self.address
        } else {
            &self.active_address
        };
        let addr: IpAddr = text.parse().with_context(|| {
            format!(
                "Lease {} ({name}, {}) has invalid address {text:?}",
                self.id, self.mac_address
            )
        })?;
        Ok(Some(
            Record::new(name, RecordData::from_ip(addr))
                .with_source(SOURCE_MIKROTIK_DHCP, source_name),
        ))
    }
}

pub struct MikrotikDhcpSource {
    name: String,
    cfg: MikrotikDhcpConfig,
    client: RestClient,
}

impl MikrotikDhcpSource {
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid URL.
    pub fn new(cfg: MikrotikDhcpConfig) -> Result<Self> {
        let auth = Auth::Basic {
            username: cfg.user.clone(),
            password: cfg.password.clone(),
        };
        let client = RestClient::new(&cfg.url, auth, cfg.options.timeout())?;
        Ok(Self {
            name: cfg.options.name_or(&cfg.url),
            cfg,
            client,
        })
    }
}

#[async_trait]
impl Source for MikrotikDhcpSource {
    fn source_type(&self) -> &str {
        SOURCE_MIKROTIK_DHCP
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.cfg.options.timeout()
    }

    async fn read(&self, _token: &CancellationToken) -> Result<Vec<Record>> {
        let leases: Vec<Lease> = self.client.get(LEASES_PATH).await?;

        let mut records = Vec::with_capacity(leases.len());
        for lease in &leases {
            if let Some(rec) = lease.to_record(&self.name)? {
                records.push(rec);
            }
        }

        Ok(apply_filter(
            SOURCE_MIKROTIK_DHCP,
            &self.name,
            &self.cfg.options.filter,
            records,
        ))
    }
}

#[cfg(test)]
#[path = "mikrotik_dhcp_tests.rs"]
mod mikrotik_dhcp_tests;
