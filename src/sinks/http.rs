// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Serves the last published set as JSON `{records: [...]}`.

use super::Sink;
use crate::constants::{DEFAULT_HTTP_SINK_PATH, SINK_HTTP};
use crate::filter::RecordFilter;
use crate::record::{Record, RecordList};
use anyhow::Result;
use async_trait::async_trait;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn default_path() -> String {
    DEFAULT_HTTP_SINK_PATH.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSinkConfig {
    /// Route the record list is served on
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub filter: RecordFilter,
}

/// `path` with a leading slash.
pub(crate) fn route_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

type Published = Arc<RwLock<Vec<Record>>>;

pub struct HttpSink {
    path: String,
    filter: RecordFilter,
    records: Published,
}

impl HttpSink {
    #[must_use]
    pub fn new(cfg: HttpSinkConfig) -> Self {
        Self {
            path: route_path(&cfg.path),
            filter: cfg.filter,
            records: Published::default(),
        }
    }

    /// Route serving the current set.
    pub fn routes(&self) -> Router {
        Router::new()
            .route(&self.path, get(list_records))
            .with_state(Arc::clone(&self.records))
    }
}

async fn list_records(State(records): State<Published>) -> Json<RecordList> {
    Json(RecordList {
        records: records.read().clone(),
    })
}

#[async_trait]
impl Sink for HttpSink {
    fn sink_type(&self) -> &str {
        SINK_HTTP
    }

    async fn write(&self, records: &[Record], _token: &CancellationToken) -> Result<()> {
        let kept = records
            .iter()
            .filter(|rec| self.filter.matches(rec))
            .cloned()
            .collect();
        *self.records.write() = kept;
        Ok(())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod http_tests;
