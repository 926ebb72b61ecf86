// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Authoritative DNS responder over the published record set.
//!
//! The sink side rebuilds a [`ResolutionStore`] on every write; the responder
//! side answers UDP queries from whatever snapshot is current. Answers carry the
//! authoritative flag and a fixed short TTL.
//!
//! Question types without a record mapping get an empty `NOERROR` answer, opcodes
//! other than `QUERY` get `NOTIMP`, and datagrams that do not decode are dropped.

use super::Sink;
use crate::constants::{DEFAULT_ANSWER_TTL_SECS, MAX_UDP_DATAGRAM_SIZE, SINK_DNSSERVER};
use crate::filter::RecordFilter;
use crate::metrics;
use crate::record::{Record, RecordData, RecordType};
use crate::store::{Answer, ResolutionStore};
use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::{rdata, Name, RData, Record as WireRecord, RecordType as WireType};
use serde::Deserialize;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct DnsServerConfig {
    /// UDP `host:port` to answer on
    pub listen_addr: String,
    /// Only records passing this filter are served
    #[serde(default)]
    pub filter: RecordFilter,
}

/// Rebuilds the resolution store from each published set.
pub struct DnsServerSink {
    filter: RecordFilter,
    store: ResolutionStore,
}

impl DnsServerSink {
    /// Sink over an existing store, without a socket.
    #[must_use]
    pub fn new(filter: RecordFilter, store: ResolutionStore) -> Self {
        Self { filter, store }
    }

    /// Bind the listen address and return the sink with its responder.
    ///
    /// # Errors
    ///
    /// Returns an error if the UDP socket cannot be bound.
    pub async fn bind(cfg: DnsServerConfig) -> Result<(Self, DnsResponder)> {
        let store = ResolutionStore::new();
        let responder = DnsResponder::bind(&cfg.listen_addr, store.clone()).await?;
        Ok((Self::new(cfg.filter, store), responder))
    }

    #[must_use]
    pub fn store(&self) -> &ResolutionStore {
        &self.store
    }
}

#[async_trait]
impl Sink for DnsServerSink {
    fn sink_type(&self) -> &str {
        SINK_DNSSERVER
    }

    async fn write(&self, records: &[Record], _token: &CancellationToken) -> Result<()> {
        let served: Vec<Record> = records
            .iter()
            .filter(|rec| self.filter.matches(rec))
            .cloned()
            .collect();
        self.store.replace(&served);
        Ok(())
    }
}

/// A bound UDP socket answering from a [`ResolutionStore`].
pub struct DnsResponder {
    socket: UdpSocket,
    store: ResolutionStore,
}

impl DnsResponder {
    /// # Errors
    ///
    /// Returns an error if `listen_addr` cannot be bound.
    pub async fn bind(listen_addr: &str, store: ResolutionStore) -> Result<Self> {
        let socket = UdpSocket::bind(listen_addr)
            .await
            .with_context(|| format!("Failed to bind DNS listener on {listen_addr}"))?;
        Ok(Self { socket, store })
    }

    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().context("DNS listener has no local address")
    }

    /// Answer queries until `token` is cancelled.
    pub async fn serve(self, token: CancellationToken) {
        if let Ok(addr) = self.socket.local_addr() {
            info!(addr = %addr, "DNS responder listening");
        }
        let mut buf = vec![0u8; MAX_UDP_DATAGRAM_SIZE];

        loop {
            let (len, peer) = tokio::select! {
                () = token.cancelled() => {
                    info!("DNS responder stopped");
                    return;
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok(received) => received,
                    Err(e) => {
                        warn!(error = %e, "Failed to receive DNS datagram");
                        continue;
                    }
                },
            };

            let Some(reply) = respond(&self.store, &buf[..len]) else {
                continue;
            };
            if let Err(e) = self.socket.send_to(&reply, peer).await {
                warn!(peer = %peer, error = %e, "Failed to send DNS response");
            }
        }
    }
}

/// Record type served for a question type, if any.
fn served_type(qtype: WireType) -> Option<RecordType> {
    match qtype {
        WireType::A => Some(RecordType::A),
        WireType::AAAA => Some(RecordType::AAAA),
        WireType::PTR => Some(RecordType::PTR),
        WireType::CNAME => Some(RecordType::CNAME),
        WireType::SRV => Some(RecordType::SRV),
        WireType::MX => Some(RecordType::MX),
        _ => None,
    }
}

fn to_wire(answer: &Answer) -> Result<WireRecord> {
    let owner = Name::from_ascii(&answer.owner)?;
    let rdata = match &answer.data {
        RecordData::A(v4) => RData::A(rdata::A(*v4)),
        RecordData::AAAA(v6) => RData::AAAA(rdata::AAAA(*v6)),
        RecordData::PTR { ptr } => RData::PTR(rdata::PTR(Name::from_ascii(ptr)?)),
        RecordData::CNAME { target } => RData::CNAME(rdata::CNAME(Name::from_ascii(target)?)),
        RecordData::SRV {
            priority,
            weight,
            port,
            target,
        } => RData::SRV(rdata::SRV::new(*priority, *weight, *port, Name::from_ascii(target)?)),
        RecordData::MX { preference, mx } => {
            RData::MX(rdata::MX::new(*preference, Name::from_ascii(mx)?))
        }
    };
    Ok(WireRecord::from_rdata(owner, DEFAULT_ANSWER_TTL_SECS, rdata))
}

/// Build the response datagram for one request datagram.
///
/// Returns `None` for datagrams that should not be answered: undecodable input
/// and messages that are themselves responses.
#[must_use]
pub fn respond(store: &ResolutionStore, request: &[u8]) -> Option<Vec<u8>> {
    let request = match Message::from_vec(request) {
        Ok(msg) => msg,
        Err(e) => {
            debug!(error = %e, "Dropping malformed DNS datagram");
            return None;
        }
    };
    if request.message_type() != MessageType::Query {
        return None;
    }

    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_authoritative(true)
        .set_recursion_desired(request.recursion_desired())
        .add_queries(request.queries().to_vec());

    if request.op_code() != OpCode::Query {
        response.set_response_code(ResponseCode::NotImp);
    } else {
        for query in request.queries() {
            let qtype = query.query_type();
            let served = served_type(qtype);
            let answers = served
                .map(|rtype| store.answer(&query.name().to_ascii(), rtype))
                .unwrap_or_default();
            // Unserved question types share one label.
            metrics::record_dns_query(
                served.map_or("other", RecordType::as_str),
                !answers.is_empty(),
            );

            for answer in &answers {
                match to_wire(answer) {
                    Ok(record) => {
                        response.add_answer(record);
                    }
                    Err(e) => {
                        warn!(owner = %answer.owner, data = %answer.data, error = %e, "Cannot encode answer");
                    }
                }
            }
        }
    }

    match response.to_vec() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(error = %e, "Failed to encode DNS response");
            None
        }
    }
}

#[cfg(test)]
#[path = "dnsserver_tests.rs"]
mod dnsserver_tests;
