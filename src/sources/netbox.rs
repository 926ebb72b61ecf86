// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Address records from `NetBox` IPAM.
//!
//! Pages through every IP address that has a DNS name and turns each into an A or
//! AAAA record. Entries that cannot be converted are logged and skipped; a failed
//! page request fails the whole read.

use super::{apply_filter, Source, SourceOptions};
use crate::constants::{NETBOX_PAGE_SIZE, SOURCE_NETBOX};
use crate::record::{Record, RecordData};
use crate::rest::{Auth, RestClient};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

const IP_ADDRESSES_PATH: &str = "/api/ipam/ip-addresses/";

#[derive(Debug, Clone, Deserialize)]
pub struct NetboxConfig {
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(flatten)]
    pub options: SourceOptions,
}

/// One page of `/api/ipam/ip-addresses/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpAddressPage {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<IpAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpAddress {
    #[serde(default)]
    pub id: u64,
    /// CIDR notation, e.g. `10.0.0.5/24`
    pub address: String,
    #[serde(default)]
    pub dns_name: Option<String>,
}

impl IpAddress {
    fn to_record(&self, source_name: &str) -> Result<Record> {
        let name = self
            .dns_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| anyhow!("address has no DNS name"))?;
        let host = self.address.split('/').next().unwrap_or_default();
        let addr: IpAddr = host
            .parse()
            .with_context(|| format!("invalid address {:?}", self.address))?;
        Ok(Record::new(name, RecordData::from_ip(addr)).with_source(SOURCE_NETBOX, source_name))
    }
}

pub struct NetboxSource {
    name: String,
    cfg: NetboxConfig,
    client: RestClient,
}

impl NetboxSource {
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid URL.
    pub fn new(cfg: NetboxConfig) -> Result<Self> {
        let client = RestClient::new(&cfg.url, Auth::Token(cfg.token.clone()), cfg.options.timeout())?;
        Ok(Self {
            name: cfg.options.name_or(&cfg.url),
            cfg,
            client,
        })
    }

    fn page_url(&self, offset: usize) -> Result<url::Url> {
        let mut url = self.client.url(IP_ADDRESSES_PATH)?;
        url.query_pairs_mut()
            .append_pair("dns_name__empty", "false")
            .append_pair("limit", &NETBOX_PAGE_SIZE.to_string())
            .append_pair("offset", &offset.to_string());
        Ok(url)
    }
}

#[async_trait]
impl Source for NetboxSource {
    fn source_type(&self) -> &str {
        SOURCE_NETBOX
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.cfg.options.timeout()
    }

    async fn read(&self, _token: &CancellationToken) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut offset = 0;

        loop {
            let page: IpAddressPage = self
                .client
                .get_url(self.page_url(offset)?)
                .await
                .context("netbox: list ip addresses")?;
            if page.results.is_empty() {
                break;
            }
            debug!(source_name = %self.name, offset = offset, count = page.results.len(), "Fetched NetBox page");

            for entry in &page.results {
                match entry.to_record(&self.name) {
                    Ok(rec) => records.push(rec),
                    Err(e) => {
                        error!(source_name = %self.name, id = entry.id, address = %entry.address, error = %e, "Skipping NetBox address");
                    }
                }
            }

            offset += page.results.len();
            if page.next.is_none() {
                break;
            }
        }

        Ok(apply_filter(SOURCE_NETBOX, &self.name, &self.cfg.options.filter, records))
    }
}

#[cfg(test)]
#[path = "netbox_tests.rs"]
mod netbox_tests;
