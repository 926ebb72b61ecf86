// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Address ↔ PTR name conversion.
//!
//! IPv4 addresses map to four reversed octet labels under `in-addr.arpa.`;
//! IPv6 addresses map to 32 reversed nibble labels under `ip6.arpa.`.
//!
//! ```rust
//! use dnsweave::reverse::{addr_to_ptr, ptr_to_addr};
//!
//! let addr = "192.0.2.10".parse().unwrap();
//! let name = addr_to_ptr(addr);
//! assert_eq!(name, "10.2.0.192.in-addr.arpa.");
//! assert_eq!(ptr_to_addr(&name).unwrap(), addr);
//! ```

use crate::constants::{IPV4_PTR_LABELS, IPV4_REVERSE_SUFFIX, IPV6_PTR_LABELS, IPV6_REVERSE_SUFFIX};
use crate::dns_errors::PtrError;
use std::fmt::Write;
use std::net::{IpAddr, Ipv6Addr};

/// Reverse-lookup name for `addr`, with trailing dot.
#[must_use]
pub fn addr_to_ptr(addr: IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => {
            let [a, b, c, d] = v4.octets();
            format!("{d}.{c}.{b}.{a}{IPV4_REVERSE_SUFFIX}")
        }
        IpAddr::V6(v6) => {
            let mut name = String::with_capacity(IPV6_PTR_LABELS * 2 + IPV6_REVERSE_SUFFIX.len());
            for byte in v6.octets().iter().rev() {
                // low nibble first: the reversed order puts it closest to the host end
                let _ = write!(name, "{:x}.{:x}.", byte & 0x0f, byte >> 4);
            }
            name.push_str(&IPV6_REVERSE_SUFFIX[1..]);
            name
        }
    }
}

/// Address encoded by a PTR name.
///
/// Accepts the name with or without a trailing dot and in any letter case.
///
/// # Errors
///
/// Returns [`PtrError`] when the suffix is unknown, the label count does not
/// match the suffix, or the labels do not form an address.
pub fn ptr_to_addr(name: &str) -> Result<IpAddr, PtrError> {
    let lowered = name.trim_end_matches('.').to_ascii_lowercase();

    let (labels, expected, v4) = if let Some(rest) = lowered.strip_suffix(IPV4_REVERSE_SUFFIX.trim_end_matches('.')) {
        (rest, IPV4_PTR_LABELS, true)
    } else if let Some(rest) = lowered.strip_suffix(IPV6_REVERSE_SUFFIX.trim_end_matches('.')) {
        (rest, IPV6_PTR_LABELS, false)
    } else {
        return Err(PtrError::UnknownSuffix {
            name: name.to_string(),
        });
    };

    let mut parts: Vec<&str> = if labels.is_empty() {
        Vec::new()
    } else {
        labels.split('.').collect()
    };
    if parts.len() != expected {
        return Err(PtrError::WrongLabelCount {
            name: name.to_string(),
            expected,
            found: parts.len(),
        });
    }
    parts.reverse();

    let invalid = |reason: String| PtrError::InvalidAddress {
        name: name.to_string(),
        reason,
    };

    if v4 {
        let literal = parts.join(".");
        return literal
            .parse::<std::net::Ipv4Addr>()
            .map(IpAddr::V4)
            .map_err(|e| invalid(format!("{literal}: {e}")));
    }

    let mut bits: u128 = 0;
    for nibble in &parts {
        let mut chars = nibble.chars();
        let digit = match (chars.next(), chars.next()) {
            (Some(c), None) => c.to_digit(16),
            _ => None,
        }
        .ok_or_else(|| invalid(format!("label '{nibble}' is not a hex nibble")))?;
        bits = (bits << 4) | u128::from(digit);
    }
    Ok(IpAddr::V6(Ipv6Addr::from(bits)))
}

#[cfg(test)]
#[path = "reverse_tests.rs"]
mod reverse_tests;
