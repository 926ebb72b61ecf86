// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Template-driven record rewriting.
//!
//! For every record passing the filter, each configured field is re-rendered
//! from a Tera template. Templates see the record as `record`, in its flat form
//! (`record.name`, `record.type`, `record.address`, ...). Fields are rendered in
//! a fixed order and each template sees the result of the ones before it:
//!
//! `record_type`, `name`, `address`, `ptr`, `target`, `priority`, `weight`,
//! `port`, `preference`, `mx`
//!
//! Changing the type clears the payload fields the new type does not use. The
//! rewritten record is validated again, so a template producing an address for a
//! CNAME, or a port that is not a number, fails the modifier.
//!
//! ```yaml
//! - type: rewrite
//!   filter:
//!     accept:
//!       match_expressions:
//!         - {field: name, operator: HasSuffix, values: ["docker."]}
//!   name: "{{ record.name | replace(from='.docker.', to='.lan.') }}"
//! ```

use super::Modifier;
use crate::dns_errors::{ConfigError, RecordError};
use crate::filter::RecordFilter;
use crate::record::{RawRecord, Record, RecordType};
use anyhow::{Context, Result};
use serde::Deserialize;
use tera::Tera;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RewriteConfig {
    #[serde(default)]
    pub filter: RecordFilter,
    #[serde(default)]
    pub record_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub ptr: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub preference: Option<String>,
    #[serde(default)]
    pub mx: Option<String>,
}

impl RewriteConfig {
    /// Configured templates in render order.
    fn templates(&self) -> Vec<(&'static str, &String)> {
        [
            ("record_type", &self.record_type),
            ("name", &self.name),
            ("address", &self.address),
            ("ptr", &self.ptr),
            ("target", &self.target),
            ("priority", &self.priority),
            ("weight", &self.weight),
            ("port", &self.port),
            ("preference", &self.preference),
            ("mx", &self.mx),
        ]
        .into_iter()
        .filter_map(|(field, template)| template.as_ref().map(|t| (field, t)))
        .collect()
    }
}

pub struct RewriteModifier {
    filter: RecordFilter,
    tera: Tera,
    fields: Vec<&'static str>,
}

impl RewriteModifier {
    /// Compile every configured template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplate`] naming the first field whose template
    /// does not compile.
    pub fn new(cfg: RewriteConfig) -> Result<Self, ConfigError> {
        let mut tera = Tera::default();
        let mut fields = Vec::new();
        for (field, template) in cfg.templates() {
            tera.add_raw_template(field, template)
                .map_err(|e| ConfigError::InvalidTemplate {
                    field: field.to_string(),
                    reason: error_chain(&e),
                })?;
            fields.push(field);
        }
        Ok(Self {
            filter: cfg.filter,
            tera,
            fields,
        })
    }

    fn rewrite(&self, rec: Record) -> Result<Record> {
        let original = rec.to_string();
        let mut raw = RawRecord::from(rec);

        for field in &self.fields {
            let mut context = tera::Context::new();
            context.insert("record", &raw);
            let value = self
                .tera
                .render(field, &context)
                .with_context(|| format!("rewrite {original}: render {field}"))?
                .trim()
                .to_string();
            apply_field(&mut raw, field, value).with_context(|| format!("rewrite {original}"))?;
        }

        Record::try_from(raw).with_context(|| format!("rewrite {original}"))
    }
}

/// Tera keeps the parser diagnostic in the error's source chain.
fn error_chain(err: &tera::Error) -> String {
    let mut reason = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        reason.push_str(": ");
        reason.push_str(&cause.to_string());
        source = cause.source();
    }
    reason
}

fn apply_field(raw: &mut RawRecord, field: &'static str, value: String) -> Result<(), RecordError> {
    let number = |value: &str| {
        value.parse::<u16>().map_err(|_| RecordError::InvalidNumber {
            field,
            value: value.to_string(),
        })
    };
    match field {
        "record_type" => {
            let record_type: RecordType = value.parse()?;
            raw.record_type = record_type.to_string();
            raw.retain_fields_for(record_type);
        }
        "name" => raw.name = value,
        "address" => raw.address = Some(value),
        "ptr" => raw.ptr = Some(value),
        "target" => raw.target = Some(value),
        "priority" => raw.priority = Some(number(&value)?),
        "weight" => raw.weight = Some(number(&value)?),
        "port" => raw.port = Some(number(&value)?),
        "preference" => raw.preference = Some(number(&value)?),
        "mx" => raw.mx = Some(value),
        _ => {}
    }
    Ok(())
}

impl Modifier for RewriteModifier {
    fn modifier_type(&self) -> &str {
        "rewrite"
    }

    fn modify(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        let mut rewritten = 0;
        let records = records
            .into_iter()
            .map(|rec| {
                if self.filter.matches(&rec) {
                    rewritten += 1;
                    self.rewrite(rec)
                } else {
                    Ok(rec)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(modifier = "rewrite", rewritten = rewritten, "Rewrite applied");
        Ok(records)
    }
}

#[cfg(test)]
#[path = "rewrite_tests.rs"]
mod rewrite_tests;
