// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTML table of the last published set, served at `/`.

use super::Sink;
use crate::constants::SINK_DASHBOARD;
use crate::record::Record;
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::Tera;
use tokio_util::sync::CancellationToken;
use tracing::error;

const TEMPLATE_NAME: &str = "dashboard.html";
const TEMPLATE: &str = include_str!("templates/dashboard.html");

fn default_title() -> String {
    "dnsweave".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Page heading
    #[serde(default = "default_title")]
    pub title: String,
}

/// One table row.
#[derive(Debug, Serialize)]
struct Row {
    name: String,
    record_type: String,
    value: String,
    source: String,
    source_name: String,
}

impl From<&Record> for Row {
    fn from(rec: &Record) -> Self {
        Self {
            name: rec.name.clone(),
            record_type: rec.record_type().to_string(),
            value: rec.data.to_string(),
            source: rec.source.clone(),
            source_name: rec.source_name.clone(),
        }
    }
}

#[derive(Default)]
struct Snapshot {
    records: Vec<Record>,
    updated: Option<DateTime<Utc>>,
}

struct Page {
    title: String,
    tera: Tera,
    snapshot: RwLock<Snapshot>,
}

impl Page {
    fn render(&self) -> Result<String> {
        let snapshot = self.snapshot.read();
        let rows: Vec<Row> = snapshot.records.iter().map(Row::from).collect();

        let mut ctx = tera::Context::new();
        ctx.insert("title", &self.title);
        ctx.insert("rows", &rows);
        ctx.insert(
            "updated",
            &snapshot
                .updated
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        self.tera
            .render(TEMPLATE_NAME, &ctx)
            .context("render dashboard")
    }
}

pub struct DashboardSink {
    page: Arc<Page>,
}

impl DashboardSink {
    /// # Errors
    ///
    /// Returns an error if the page template does not compile.
    pub fn new(cfg: DashboardConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)
            .context("compile dashboard template")?;
        Ok(Self {
            page: Arc::new(Page {
                title: cfg.title,
                tera,
                snapshot: RwLock::new(Snapshot::default()),
            }),
        })
    }

    pub fn routes(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .with_state(Arc::clone(&self.page))
    }

    /// Current page body.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render(&self) -> Result<String> {
        self.page.render()
    }
}

async fn index(State(page): State<Arc<Page>>) -> Result<Html<String>, (StatusCode, String)> {
    page.render().map(Html).map_err(|e| {
        error!(error = %format!("{e:#}"), "Failed to render dashboard");
        (StatusCode::INTERNAL_SERVER_ERROR, "dashboard unavailable".to_string())
    })
}

#[async_trait]
impl Sink for DashboardSink {
    fn sink_type(&self) -> &str {
        SINK_DASHBOARD
    }

    async fn write(&self, records: &[Record], _token: &CancellationToken) -> Result<()> {
        let mut sorted = records.to_vec();
        sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut snapshot = self.page.snapshot.write();
        snapshot.records = sorted;
        snapshot.updated = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod dashboard_tests;
