// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration document.
//!
//! ```yaml
//! interval: 30s
//! http_listen_addr: 0.0.0.0:8080
//! sources:
//!   - type: file
//!     path: /etc/dnsweave/static.yaml
//! modifiers:
//!   - type: autoptr
//! sinks:
//!   - type: dnsserver
//!     listen_addr: 0.0.0.0:53
//!   - type: dashboard
//! ```
//!
//! Filters and rewrite templates are compiled while decoding, so a document that
//! loads is one the pipeline can run.

use crate::constants::{HEALTH_PATH, METRICS_PATH};
use crate::dns_errors::ConfigError;
use crate::modifiers::ModifierConfig;
use crate::sinks::{SinkConfig, SinkSet};
use crate::sources::SourceConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Serde adapter for optional `humantime` durations (`"10s"`, `"1m30s"`).
pub mod duration_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// # Errors
    ///
    /// Returns an error if the string is not a valid duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
            .transpose()
    }

    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Time between sync cycles
    pub interval: String,
    /// Address of the HTTP server for metrics, health and HTTP-served sinks
    #[serde(default)]
    pub http_listen_addr: Option<SocketAddr>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub modifiers: Vec<ModifierConfig>,
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

impl Config {
    /// Read, decode and validate the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] for IO and decode
    /// failures, and any error of [`Config::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::parse(&text).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Decode and validate a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for decode failures, and any error of
    /// [`Config::validate`].
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed sync interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidInterval`] or [`ConfigError::ZeroInterval`].
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        let interval =
            humantime::parse_duration(&self.interval).map_err(|e| ConfigError::InvalidInterval {
                value: self.interval.clone(),
                reason: e.to_string(),
            })?;
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(interval)
    }

    /// Check cross-field constraints the decoder cannot express.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidInterval`] / [`ConfigError::ZeroInterval`] for a bad interval
    /// - [`ConfigError::MissingHttpListenAddr`] when an HTTP-served sink has no server
    /// - [`ConfigError::RouteConflict`] when two handlers claim one path
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.interval()?;

        if self.http_listen_addr.is_none() {
            if let Some(sink) = self.sinks.iter().find(|s| s.needs_http()) {
                return Err(ConfigError::MissingHttpListenAddr {
                    sink: sink.sink_type().to_string(),
                });
            }
        }

        let mut paths: HashSet<String> = [METRICS_PATH, HEALTH_PATH]
            .into_iter()
            .map(str::to_string)
            .collect();
        for path in self.sinks.iter().filter_map(SinkConfig::http_path) {
            if !paths.insert(path.clone()) {
                return Err(ConfigError::RouteConflict { path });
            }
        }
        Ok(())
    }
}

/// Everything built from a [`Config`], ready to run.
pub struct Pipeline {
    pub orchestrator: crate::orchestrator::Orchestrator,
    pub sinks: SinkSet,
}

impl Pipeline {
    /// Construct every adapter and bind sockets.
    ///
    /// Sinks are taken out of the returned [`SinkSet`] and handed to the
    /// orchestrator; the router and responders stay behind for the caller.
    ///
    /// # Errors
    ///
    /// Returns the first adapter construction or bind failure.
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let interval = config.interval()?;
        let sources = config
            .sources
            .into_iter()
            .map(SourceConfig::build)
            .collect::<anyhow::Result<Vec<_>>>()?;
        let modifiers = config
            .modifiers
            .into_iter()
            .map(ModifierConfig::build)
            .collect::<anyhow::Result<Vec<_>>>()?;
        let mut sinks = crate::sinks::build_sinks(config.sinks).await?;

        let orchestrator = crate::orchestrator::Orchestrator::new(
            interval,
            sources,
            modifiers,
            std::mem::take(&mut sinks.sinks),
        )?;
        Ok(Self {
            orchestrator,
            sinks,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
