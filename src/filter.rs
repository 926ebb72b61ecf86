// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record predicates for filter, rewrite and autoptr stages and for per-adapter filters.
//!
//! A [`RecordFilter`] has an optional `accept` and an optional `reject`
//! [`RecordSelector`]. A record passes when it matches `accept` (if set) and
//! does not match `reject` (if set). Selectors follow label-selector semantics:
//! `match_fields` and `match_expressions` are `ANDed`, and an empty selector
//! matches every record.
//!
//! # Example
//!
//! ```yaml
//! filter:
//!   accept:
//!     match_fields:
//!       type: A
//!     match_expressions:
//!       - field: name
//!         operator: HasSuffix
//!         values: ["lan."]
//!       - field: address
//!         operator: InSubnet
//!         values: ["192.168.0.0/16"]
//!   reject:
//!     match_expressions:
//!       - field: source
//!         operator: In
//!         values: ["autoptr"]
//! ```
//!
//! Fields that the record's type does not carry (for example `address` on a
//! CNAME) are absent: `In`, `Exists`, `HasSuffix`, `HasPrefix` and `InSubnet`
//! do not match them, while `NotIn`, `DoesNotExist` and `NotInSubnet` do.
//!
//! Selectors are compiled while the configuration is decoded, so evaluation
//! itself cannot fail.

use crate::dns_errors::FilterError;
use crate::record::{normalize_name, Record, RecordData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Record field addressable by a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    #[serde(rename = "type")]
    RecordType,
    Source,
    SourceName,
    Address,
    Ptr,
    Target,
    Priority,
    Weight,
    Port,
    Preference,
    Mx,
}

impl Field {
    /// Fields holding domain names, compared case-insensitively with a trailing dot.
    fn is_domain_name(self) -> bool {
        matches!(self, Self::Name | Self::Ptr | Self::Target | Self::Mx)
    }

    /// Value of this field on `rec`, or `None` when the record type lacks it.
    #[must_use]
    pub fn value(self, rec: &Record) -> Option<String> {
        match (self, &rec.data) {
            (Self::Name, _) => Some(rec.name.clone()),
            (Self::RecordType, _) => Some(rec.record_type().to_string()),
            (Self::Source, _) => Some(rec.source.clone()),
            (Self::SourceName, _) => Some(rec.source_name.clone()),
            (Self::Address, _) => rec.address().map(|a| a.to_string()),
            (Self::Ptr, RecordData::PTR { ptr }) => Some(ptr.clone()),
            (Self::Target, RecordData::CNAME { target } | RecordData::SRV { target, .. }) => {
                Some(target.clone())
            }
            (Self::Priority, RecordData::SRV { priority, .. }) => Some(priority.to_string()),
            (Self::Weight, RecordData::SRV { weight, .. }) => Some(weight.to_string()),
            (Self::Port, RecordData::SRV { port, .. }) => Some(port.to_string()),
            (Self::Preference, RecordData::MX { preference, .. }) => Some(preference.to_string()),
            (Self::Mx, RecordData::MX { mx, .. }) => Some(mx.clone()),
            _ => None,
        }
    }

    /// Canonical form used on both sides of a comparison.
    fn canonical(self, value: &str) -> String {
        if self.is_domain_name() {
            normalize_name(value.trim()).to_ascii_lowercase()
        } else if self == Self::RecordType {
            value.trim().to_ascii_uppercase()
        } else if self == Self::Address {
            value
                .trim()
                .parse::<IpAddr>()
                .map_or_else(|_| value.trim().to_string(), |a| a.to_string())
        } else {
            value.to_string()
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::RecordType => "type",
            Self::Source => "source",
            Self::SourceName => "source_name",
            Self::Address => "address",
            Self::Ptr => "ptr",
            Self::Target => "target",
            Self::Priority => "priority",
            Self::Weight => "weight",
            Self::Port => "port",
            Self::Preference => "preference",
            Self::Mx => "mx",
        };
        f.write_str(name)
    }
}

/// Relationship between a field and a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
    HasSuffix,
    HasPrefix,
    InSubnet,
    NotInSubnet,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An IP prefix such as `10.0.0.0/8` or `fd00::/8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
    network: IpAddr,
    prefix_len: u8,
}

impl Subnet {
    /// Whether `addr` falls inside the prefix. Addresses of the other family never match.
    #[must_use]
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(a)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix_len)).unwrap_or(0);
                u32::from(net) & mask == u32::from(a) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(a)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix_len)).unwrap_or(0);
                u128::from(net) & mask == u128::from(a) & mask
            }
            _ => false,
        }
    }
}

impl FromStr for Subnet {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| FilterError::InvalidSubnet {
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let (addr, len) = s.trim().split_once('/').ok_or_else(|| invalid("missing prefix length"))?;
        let network: IpAddr = addr.parse().map_err(|_| invalid("invalid network address"))?;
        let prefix_len: u8 = len.parse().map_err(|_| invalid("invalid prefix length"))?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        if prefix_len > max {
            return Err(invalid("prefix length out of range"));
        }
        Ok(Self {
            network,
            prefix_len,
        })
    }
}

/// One `{field, operator, values}` requirement as written in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRequirement {
    pub field: Field,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// Selector as written in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// Exact field values; each entry is equivalent to an `In` requirement with one value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_fields: BTreeMap<Field, String>,
    /// Requirements, all of which must hold
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<FieldRequirement>,
}

#[derive(Debug, Clone)]
enum Matcher {
    In(Vec<String>),
    NotIn(Vec<String>),
    Exists,
    DoesNotExist,
    HasSuffix(Vec<String>),
    HasPrefix(Vec<String>),
    InSubnet(Vec<Subnet>),
    NotInSubnet(Vec<Subnet>),
}

#[derive(Debug, Clone)]
struct CompiledRequirement {
    field: Field,
    matcher: Matcher,
}

impl CompiledRequirement {
    fn compile(req: &FieldRequirement) -> Result<Self, FilterError> {
        let needs_values = !matches!(req.operator, Operator::Exists | Operator::DoesNotExist);
        if needs_values && req.values.is_empty() {
            return Err(FilterError::MissingValues {
                field: req.field.to_string(),
                operator: req.operator.to_string(),
            });
        }
        if !needs_values && !req.values.is_empty() {
            return Err(FilterError::UnexpectedValues {
                field: req.field.to_string(),
                operator: req.operator.to_string(),
            });
        }

        let canonical = || -> Vec<String> {
            req.values.iter().map(|v| req.field.canonical(v)).collect()
        };
        let subnets = || -> Result<Vec<Subnet>, FilterError> {
            req.values.iter().map(|v| v.parse()).collect()
        };

        let matcher = match req.operator {
            Operator::In => Matcher::In(canonical()),
            Operator::NotIn => Matcher::NotIn(canonical()),
            Operator::Exists => Matcher::Exists,
            Operator::DoesNotExist => Matcher::DoesNotExist,
            Operator::HasSuffix => Matcher::HasSuffix(canonical()),
            Operator::HasPrefix => Matcher::HasPrefix(
                req.values
                    .iter()
                    .map(|v| {
                        if req.field.is_domain_name() {
                            v.trim().to_ascii_lowercase()
                        } else {
                            v.clone()
                        }
                    })
                    .collect(),
            ),
            Operator::InSubnet => Matcher::InSubnet(subnets()?),
            Operator::NotInSubnet => Matcher::NotInSubnet(subnets()?),
        };

        Ok(Self {
            field: req.field,
            matcher,
        })
    }

    fn matches(&self, rec: &Record) -> bool {
        let value = self.field.value(rec).map(|v| self.field.canonical(&v));
        let Some(value) = value else {
            return matches!(
                self.matcher,
                Matcher::NotIn(_) | Matcher::DoesNotExist | Matcher::NotInSubnet(_)
            );
        };

        match &self.matcher {
            Matcher::In(values) => values.contains(&value),
            Matcher::NotIn(values) => !values.contains(&value),
            Matcher::Exists => true,
            Matcher::DoesNotExist => false,
            Matcher::HasSuffix(values) => values.iter().any(|v| value.ends_with(v.as_str())),
            Matcher::HasPrefix(values) => values.iter().any(|v| value.starts_with(v.as_str())),
            Matcher::InSubnet(subnets) => value
                .parse::<IpAddr>()
                .is_ok_and(|a| subnets.iter().any(|s| s.contains(a))),
            Matcher::NotInSubnet(subnets) => !value
                .parse::<IpAddr>()
                .is_ok_and(|a| subnets.iter().any(|s| s.contains(a))),
        }
    }
}

/// A compiled selector over record fields.
#[derive(Debug, Clone, Default)]
pub struct RecordSelector {
    requirements: Vec<CompiledRequirement>,
}

impl RecordSelector {
    /// Whether every requirement holds for `rec`.
    #[must_use]
    pub fn matches(&self, rec: &Record) -> bool {
        self.requirements.iter().all(|r| r.matches(rec))
    }
}

impl TryFrom<SelectorSpec> for RecordSelector {
    type Error = FilterError;

    fn try_from(spec: SelectorSpec) -> Result<Self, Self::Error> {
        let exact = spec.match_fields.into_iter().map(|(field, value)| FieldRequirement {
            field,
            operator: Operator::In,
            values: vec![value],
        });
        let requirements = exact
            .chain(spec.match_expressions)
            .map(|req| CompiledRequirement::compile(&req))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { requirements })
    }
}

/// Filter configuration as written in YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<SelectorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject: Option<SelectorSpec>,
}

/// Accept/reject predicate over records. The default filter passes everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RecordFilterSpec")]
pub struct RecordFilter {
    accept: Option<RecordSelector>,
    reject: Option<RecordSelector>,
}

impl RecordFilter {
    #[must_use]
    pub fn matches(&self, rec: &Record) -> bool {
        if let Some(accept) = &self.accept {
            if !accept.matches(rec) {
                return false;
            }
        }
        if let Some(reject) = &self.reject {
            if reject.matches(rec) {
                return false;
            }
        }
        true
    }

    /// Keep only the records that pass, preserving order.
    #[must_use]
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

impl TryFrom<RecordFilterSpec> for RecordFilter {
    type Error = FilterError;

    fn try_from(spec: RecordFilterSpec) -> Result<Self, Self::Error> {
        Ok(Self {
            accept: spec.accept.map(RecordSelector::try_from).transpose()?,
            reject: spec.reject.map(RecordSelector::try_from).transpose()?,
        })
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod filter_tests;
