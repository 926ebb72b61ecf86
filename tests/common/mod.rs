// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common helpers for integration tests.

#![allow(dead_code)]

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use std::io::Write;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::net::UdpSocket;

/// Write a `{records: [...]}` YAML document to a fresh temp file.
pub fn records_file(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(yaml.as_bytes()).expect("write temp file");
    file
}

/// Overwrite the contents of an existing records file.
pub fn rewrite_records_file(file: &NamedTempFile, yaml: &str) {
    std::fs::write(file.path(), yaml).expect("rewrite temp file");
}

/// Send one question to `server` and return the decoded response.
pub async fn query(server: SocketAddr, name: &str, qtype: RecordType) -> Message {
    let mut msg = Message::new();
    msg.set_id(rand_id(name))
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(Name::from_str(name).expect("query name"), qtype));

    let socket = UdpSocket::bind("127.0.0.1:0").await.expect("bind client socket");
    socket
        .send_to(&msg.to_vec().expect("encode query"), server)
        .await
        .expect("send query");

    let mut buf = vec![0u8; 4096];
    let (len, _) = tokio::time::timeout(Duration::from_secs(5), socket.recv_from(&mut buf))
        .await
        .expect("response within 5s")
        .expect("receive response");
    let response = Message::from_vec(&buf[..len]).expect("decode response");
    assert_eq!(response.id(), msg.id());
    response
}

/// Owner name and rdata text of every answer, in order.
pub fn answers(msg: &Message) -> Vec<(String, String)> {
    msg.answers()
        .iter()
        .map(|rr| {
            let data = rr.data().map(ToString::to_string).unwrap_or_default();
            (rr.name().to_ascii(), data)
        })
        .collect()
}

fn rand_id(name: &str) -> u16 {
    name.bytes().fold(17u16, |acc, b| acc.wrapping_mul(31).wrapping_add(u16::from(b)))
}
