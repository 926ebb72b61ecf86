// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `RouterOS` static DNS entries kept in sync with the published set.
//!
//! Entries this system creates carry the configured comment as ownership marker;
//! entries with any other comment are left alone. Names are written without the
//! trailing root dot.
//!
//! | Record | Static entry             |
//! |--------|--------------------------|
//! | A      | `type=A address=...`     |
//! | AAAA   | `type=AAAA address=...`  |
//! | CNAME  | `type=CNAME cname=...`   |
//! | PTR    | skipped                  |
//! | SRV/MX | error                    |

use super::Sink;
use crate::config::duration_opt;
use crate::constants::{
    DEFAULT_ADAPTER_TIMEOUT_SECS, DEFAULT_MIKROTIK_TTL, DEFAULT_OWNERSHIP_MARKER, SINK_MIKROTIK,
};
use crate::dns_errors::RecordError;
use crate::reconcile::{self, ReconcileTarget};
use crate::record::{Record, RecordData, RecordType};
use crate::rest::{Auth, RestClient};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const STATIC_DNS_PATH: &str = "/rest/ip/dns/static";

fn default_comment() -> String {
    DEFAULT_OWNERSHIP_MARKER.to_string()
}

fn default_ttl() -> String {
    DEFAULT_MIKROTIK_TTL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MikrotikSinkConfig {
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Ownership marker written to and matched against the entry comment
    #[serde(default = "default_comment")]
    pub comment: String,
    /// TTL of created entries, in `RouterOS` syntax
    #[serde(default = "default_ttl")]
    pub ttl: String,
    #[serde(default, with = "duration_opt")]
    pub timeout: Option<Duration>,
}

/// One `/ip/dns/static` entry as `RouterOS` returns and accepts it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticEntry {
    #[serde(rename = ".id", default, skip_serializing)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Absent on plain A entries
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cname: String,
    #[serde(default)]
    pub ttl: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub disabled: String,
}

impl StaticEntry {
    fn entry_type(&self) -> &str {
        if self.entry_type.is_empty() {
            "A"
        } else {
            &self.entry_type
        }
    }
}

fn bare(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// The `/ip/dns/static` table of one router.
pub struct MikrotikTarget {
    client: RestClient,
    comment: String,
    ttl: String,
}

impl MikrotikTarget {
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid URL.
    pub fn new(cfg: &MikrotikSinkConfig) -> Result<Self> {
        let auth = Auth::Basic {
            username: cfg.user.clone(),
            password: cfg.password.clone(),
        };
        let timeout = cfg
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_ADAPTER_TIMEOUT_SECS));
        let client = RestClient::new(&cfg.url, auth, timeout)?.with_retries();
        Ok(Self {
            client,
            comment: cfg.comment.clone(),
            ttl: cfg.ttl.clone(),
        })
    }

    fn to_entry(&self, rec: &Record) -> Result<StaticEntry, RecordError> {
        let mut entry = StaticEntry {
            name: bare(&rec.name).to_string(),
            entry_type: rec.record_type().to_string(),
            ttl: self.ttl.clone(),
            comment: self.comment.clone(),
            disabled: "false".to_string(),
            ..StaticEntry::default()
        };
        match &rec.data {
            RecordData::A(_) | RecordData::AAAA(_) => {
                entry.address = rec.address().map(|a| a.to_string()).unwrap_or_default();
            }
            RecordData::CNAME { target } => entry.cname = bare(target).to_string(),
            _ => return Err(self.unsupported(rec)),
        }
        Ok(entry)
    }

    fn unsupported(&self, rec: &Record) -> RecordError {
        RecordError::UnsupportedType {
            record_type: rec.record_type().to_string(),
            target: SINK_MIKROTIK.to_string(),
        }
    }
}

#[async_trait]
impl ReconcileTarget for MikrotikTarget {
    type Entry = StaticEntry;

    fn target_name(&self) -> &str {
        SINK_MIKROTIK
    }

    fn supports(&self, rec: &Record) -> Result<bool, RecordError> {
        match rec.record_type() {
            RecordType::A | RecordType::AAAA | RecordType::CNAME => Ok(true),
            RecordType::PTR => Ok(false),
            RecordType::SRV | RecordType::MX => Err(self.unsupported(rec)),
        }
    }

    fn is_owned(&self, entry: &StaticEntry) -> bool {
        entry.comment == self.comment
    }

    fn matches(&self, rec: &Record, entry: &StaticEntry) -> bool {
        if !bare(&rec.name).eq_ignore_ascii_case(bare(&entry.name))
            || !rec.record_type().as_str().eq_ignore_ascii_case(entry.entry_type())
        {
            return false;
        }
        match &rec.data {
            RecordData::A(_) | RecordData::AAAA(_) => {
                entry.address.parse::<IpAddr>().ok() == rec.address()
            }
            RecordData::CNAME { target } => bare(target).eq_ignore_ascii_case(bare(&entry.cname)),
            _ => false,
        }
    }

    fn same_desired(&self, a: &Record, b: &Record) -> bool {
        self.to_entry(a).is_ok_and(|entry| self.matches(b, &entry))
    }

    async fn list(&self) -> Result<Vec<StaticEntry>> {
        self.client
            .get(STATIC_DNS_PATH)
            .await
            .context("list static DNS entries")
    }

    async fn add(&self, rec: &Record) -> Result<()> {
        let entry = self.to_entry(rec)?;
        debug!(name = %entry.name, entry_type = %entry.entry_type, "Creating static DNS entry");
        self.client.put(STATIC_DNS_PATH, &entry).await
    }

    async fn remove(&self, entry: &StaticEntry) -> Result<()> {
        self.client
            .delete(&format!("{STATIC_DNS_PATH}/{}", entry.id))
            .await
    }
}

/// Reconciling sink over a [`MikrotikTarget`].
pub struct MikrotikSink {
    target: MikrotikTarget,
    timeout: Option<Duration>,
}

impl MikrotikSink {
    /// # Errors
    ///
    /// Returns an error if the router URL is invalid.
    pub fn new(cfg: MikrotikSinkConfig) -> Result<Self> {
        Ok(Self {
            target: MikrotikTarget::new(&cfg)?,
            timeout: cfg.timeout,
        })
    }
}

#[async_trait]
impl Sink for MikrotikSink {
    fn sink_type(&self) -> &str {
        SINK_MIKROTIK
    }

    fn timeout(&self) -> Duration {
        self.timeout
            .unwrap_or(Duration::from_secs(DEFAULT_ADAPTER_TIMEOUT_SECS))
    }

    async fn write(&self, records: &[Record], _token: &CancellationToken) -> Result<()> {
        let summary = reconcile::sync(&self.target, records)
            .await
            .context("mikrotik sink")?;
        debug!(added = summary.added, removed = summary.removed, "Router entries reconciled");
        Ok(())
    }
}

#[cfg(test)]
#[path = "mikrotik_tests.rs"]
mod mikrotik_tests;
