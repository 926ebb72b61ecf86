// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Records fetched as a JSON `{records: [...]}` document over HTTP.

use super::{apply_filter, Source, SourceOptions};
use crate::constants::SOURCE_HTTP;
use crate::record::{Record, RecordList};
use crate::rest::{Auth, RestClient};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSourceConfig {
    pub url: String,
    /// Keep `source`/`source_name` set by the upstream document
    #[serde(default)]
    pub keep_original_source: bool,
    #[serde(flatten)]
    pub options: SourceOptions,
}

pub struct HttpSource {
    name: String,
    cfg: HttpSourceConfig,
    client: RestClient,
}

impl HttpSource {
    /// # Errors
    ///
    /// Returns an error if `url` is not a valid URL.
    pub fn new(cfg: HttpSourceConfig) -> Result<Self> {
        let client = RestClient::new(&cfg.url, Auth::None, cfg.options.timeout())?;
        Ok(Self {
            name: cfg.options.name_or(&cfg.url),
            cfg,
            client,
        })
    }
}

#[async_trait]
impl Source for HttpSource {
    fn source_type(&self) -> &str {
        SOURCE_HTTP
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.cfg.options.timeout()
    }

    async fn read(&self, _token: &CancellationToken) -> Result<Vec<Record>> {
        let list: RecordList = self.client.get("").await?;

        // The filter sees upstream provenance before it is replaced.
        let records = apply_filter(SOURCE_HTTP, &self.name, &self.cfg.options.filter, list.records)
            .into_iter()
            .map(|rec| {
                if rec.source.is_empty() || !self.cfg.keep_original_source {
                    rec.with_source(SOURCE_HTTP, &self.name)
                } else {
                    rec
                }
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
