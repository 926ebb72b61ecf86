// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Static records from a YAML file.
//!
//! The file holds a `records:` list in the flat record format. It is re-read on
//! every cycle, so edits take effect on the next tick.

use super::{apply_filter, Source, SourceOptions};
use crate::constants::SOURCE_FILE;
use crate::record::{Record, RecordList};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Deserialize)]
pub struct FileSourceConfig {
    pub path: PathBuf,
    #[serde(flatten)]
    pub options: SourceOptions,
}

pub struct FileSource {
    name: String,
    cfg: FileSourceConfig,
}

impl FileSource {
    #[must_use]
    pub fn new(cfg: FileSourceConfig) -> Self {
        let name = cfg.options.name_or(&cfg.path.display().to_string());
        Self { name, cfg }
    }
}

#[async_trait]
impl Source for FileSource {
    fn source_type(&self) -> &str {
        SOURCE_FILE
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.cfg.options.timeout()
    }

    async fn read(&self, _token: &CancellationToken) -> Result<Vec<Record>> {
        let path = &self.cfg.path;
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let list: RecordList = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let records = list
            .records
            .into_iter()
            .map(|mut rec| {
                if rec.source.is_empty() {
                    rec.source = SOURCE_FILE.to_string();
                }
                if rec.source_name.is_empty() {
                    rec.source_name.clone_from(&self.name);
                }
                rec
            })
            .collect();

        Ok(apply_filter(SOURCE_FILE, &self.name, &self.cfg.options.filter, records))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod file_tests;
