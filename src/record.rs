// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The canonical DNS record flowing through every sync cycle.
//!
//! A [`Record`] carries a normalized name, provenance metadata and exactly one
//! payload variant ([`RecordData`]). The variant is the type tag, so a record can
//! never hold a payload that disagrees with its type.
//!
//! On the wire (file source, HTTP source, HTTP sink) records use the flat shape
//! shared with the rest of the ecosystem:
//!
//! ```yaml
//! records:
//!   - type: SRV
//!     name: _http._tcp.example.com.
//!     target: web.example.com.
//!     priority: 10
//!     weight: 5
//!     port: 80
//! ```
//!
//! Decoding validates the payload against the type and normalizes names.
//!
//! # Example
//!
//! ```rust
//! use dnsweave::record::{Record, RecordData};
//!
//! let rec = Record::new("www.example.com", RecordData::A("10.0.0.1".parse().unwrap()));
//! assert_eq!(rec.name, "www.example.com.");
//! assert_eq!(rec.to_string(), "www.example.com. IN A 10.0.0.1");
//! ```

use crate::dns_errors::RecordError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Append the trailing root dot when it is missing.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

/// Closed set of record types handled by the pipeline.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    A,
    AAAA,
    PTR,
    CNAME,
    SRV,
    MX,
}

impl RecordType {
    /// Every supported type, in display order.
    pub const ALL: [RecordType; 6] = [
        RecordType::A,
        RecordType::AAAA,
        RecordType::PTR,
        RecordType::CNAME,
        RecordType::SRV,
        RecordType::MX,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::PTR => "PTR",
            Self::CNAME => "CNAME",
            Self::SRV => "SRV",
            Self::MX => "MX",
        }
    }

    /// Address-like types are the ones a CNAME is transparently chased for.
    #[must_use]
    pub fn is_address(self) -> bool {
        matches!(self, Self::A | Self::AAAA)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RecordError::UnknownType {
                value: s.to_string(),
            })
    }
}

/// Type-specific payload of a record.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    PTR {
        ptr: String,
    },
    CNAME {
        target: String,
    },
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
    },
    MX {
        preference: u16,
        mx: String,
    },
}

impl RecordData {
    /// Address payload for the given IP, picking A or AAAA by family.
    #[must_use]
    pub fn from_ip(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => Self::A(v4),
            IpAddr::V6(v6) => Self::AAAA(v6),
        }
    }

    #[must_use]
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::A(_) => RecordType::A,
            Self::AAAA(_) => RecordType::AAAA,
            Self::PTR { .. } => RecordType::PTR,
            Self::CNAME { .. } => RecordType::CNAME,
            Self::SRV { .. } => RecordType::SRV,
            Self::MX { .. } => RecordType::MX,
        }
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A(addr) => write!(f, "{addr}"),
            Self::AAAA(addr) => write!(f, "{addr}"),
            Self::PTR { ptr } => f.write_str(ptr),
            Self::CNAME { target } => f.write_str(target),
            Self::SRV {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{priority} {weight} {port} {target}"),
            Self::MX { preference, mx } => write!(f, "{preference} {mx}"),
        }
    }
}

/// A DNS record with provenance.
///
/// Equality and hashing are structural over every field, provenance included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct Record {
    /// Fully-qualified name with trailing dot
    pub name: String,
    /// Type tag of the adapter that produced the record
    pub source: String,
    /// Instance label of the adapter that produced the record
    pub source_name: String,
    /// Payload, which also determines the record type
    pub data: RecordData,
}

impl Record {
    /// Build a record with a normalized name and empty provenance.
    #[must_use]
    pub fn new(name: &str, data: RecordData) -> Self {
        Self {
            name: normalize_name(name),
            source: String::new(),
            source_name: String::new(),
            data,
        }
    }

    /// Set provenance, consuming and returning the record.
    #[must_use]
    pub fn with_source(mut self, source: &str, source_name: &str) -> Self {
        self.source = source.to_string();
        self.source_name = source_name.to_string();
        self
    }

    #[must_use]
    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// Address carried by A and AAAA records.
    #[must_use]
    pub fn address(&self) -> Option<IpAddr> {
        match self.data {
            RecordData::A(v4) => Some(IpAddr::V4(v4)),
            RecordData::AAAA(v6) => Some(IpAddr::V6(v6)),
            _ => None,
        }
    }

    /// Ordering key used by presentation sinks: name, then type, then payload.
    #[must_use]
    pub fn sort_key(&self) -> (&str, RecordType, &RecordData) {
        (&self.name, self.record_type(), &self.data)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IN {} {}", self.name, self.record_type(), self.data)
    }
}

/// Flat wire representation of a record.
///
/// Every payload field is optional here; [`Record::try_from`] enforces that the
/// populated fields match the type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx: Option<String>,
}

impl RawRecord {
    /// Clear every payload field that `record_type` does not use.
    pub fn retain_fields_for(&mut self, record_type: RecordType) {
        if !record_type.is_address() {
            self.address = None;
        }
        if record_type != RecordType::PTR {
            self.ptr = None;
        }
        if !matches!(record_type, RecordType::CNAME | RecordType::SRV) {
            self.target = None;
        }
        if record_type != RecordType::SRV {
            self.priority = None;
            self.weight = None;
            self.port = None;
        }
        if record_type != RecordType::MX {
            self.preference = None;
            self.mx = None;
        }
    }

    fn require(&self, field: &'static str, value: Option<&String>) -> Result<String, RecordError> {
        match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
            Some(v) => Ok(v.to_string()),
            None => Err(RecordError::MissingField {
                record_type: self.record_type.to_uppercase(),
                name: self.name.clone(),
                field,
            }),
        }
    }

    fn reject(&self, fields: &[(&'static str, bool)]) -> Result<(), RecordError> {
        match fields.iter().find(|(_, present)| *present) {
            Some((field, _)) => Err(RecordError::UnexpectedField {
                record_type: self.record_type.to_uppercase(),
                name: self.name.clone(),
                field,
            }),
            None => Ok(()),
        }
    }
}

impl TryFrom<RawRecord> for Record {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let name = raw.name.trim();
        if name.is_empty() || name == "." {
            return Err(RecordError::EmptyName);
        }

        let record_type: RecordType = raw.record_type.parse()?;
        let has_address = raw.address.is_some();
        let has_ptr = raw.ptr.is_some();
        let has_target = raw.target.is_some();
        let has_srv = raw.priority.is_some() || raw.weight.is_some() || raw.port.is_some();
        let has_mx = raw.preference.is_some() || raw.mx.is_some();

        let data = match record_type {
            RecordType::A | RecordType::AAAA => {
                raw.reject(&[
                    ("ptr", has_ptr),
                    ("target", has_target),
                    ("priority", has_srv),
                    ("mx", has_mx),
                ])?;
                let text = raw.require("address", raw.address.as_ref())?;
                let invalid = || RecordError::InvalidAddress {
                    record_type: record_type.to_string(),
                    name: raw.name.clone(),
                    address: text.clone(),
                };
                match (record_type, text.parse::<IpAddr>().map_err(|_| invalid())?) {
                    (RecordType::A, IpAddr::V4(v4)) => RecordData::A(v4),
                    (RecordType::AAAA, IpAddr::V6(v6)) => RecordData::AAAA(v6),
                    _ => return Err(invalid()),
                }
            }
            RecordType::PTR => {
                raw.reject(&[
                    ("address", has_address),
                    ("target", has_target),
                    ("priority", has_srv),
                    ("mx", has_mx),
                ])?;
                RecordData::PTR {
                    ptr: normalize_name(&raw.require("ptr", raw.ptr.as_ref())?),
                }
            }
            RecordType::CNAME => {
                raw.reject(&[
                    ("address", has_address),
                    ("ptr", has_ptr),
                    ("priority", has_srv),
                    ("mx", has_mx),
                ])?;
                RecordData::CNAME {
                    target: normalize_name(&raw.require("target", raw.target.as_ref())?),
                }
            }
            RecordType::SRV => {
                raw.reject(&[("address", has_address), ("ptr", has_ptr), ("mx", has_mx)])?;
                RecordData::SRV {
                    priority: raw.priority.unwrap_or_default(),
                    weight: raw.weight.unwrap_or_default(),
                    port: raw.port.unwrap_or_default(),
                    target: normalize_name(&raw.require("target", raw.target.as_ref())?),
                }
            }
            RecordType::MX => {
                raw.reject(&[
                    ("address", has_address),
                    ("ptr", has_ptr),
                    ("target", has_target),
                    ("priority", has_srv),
                ])?;
                RecordData::MX {
                    preference: raw.preference.unwrap_or_default(),
                    mx: normalize_name(&raw.require("mx", raw.mx.as_ref())?),
                }
            }
        };

        Ok(Self {
            name: normalize_name(name),
            source: raw.source,
            source_name: raw.source_name,
            data,
        })
    }
}

impl From<Record> for RawRecord {
    fn from(rec: Record) -> Self {
        let mut raw = RawRecord {
            record_type: rec.record_type().to_string(),
            name: rec.name,
            source: rec.source,
            source_name: rec.source_name,
            ..RawRecord::default()
        };
        match rec.data {
            RecordData::A(v4) => raw.address = Some(v4.to_string()),
            RecordData::AAAA(v6) => raw.address = Some(v6.to_string()),
            RecordData::PTR { ptr } => raw.ptr = Some(ptr),
            RecordData::CNAME { target } => raw.target = Some(target),
            RecordData::SRV {
                priority,
                weight,
                port,
                target,
            } => {
                raw.priority = Some(priority);
                raw.weight = Some(weight);
                raw.port = Some(port);
                raw.target = Some(target);
            }
            RecordData::MX { preference, mx } => {
                raw.preference = Some(preference);
                raw.mx = Some(mx);
            }
        }
        raw
    }
}

/// Document wrapper used by the file source, HTTP source and HTTP sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordList {
    #[serde(default)]
    pub records: Vec<Record>,
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
