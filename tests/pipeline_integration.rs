// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! End-to-end cycles: sources → modifiers → DNS responder, queried over UDP.

mod common;

use common::{answers, query, records_file, rewrite_records_file};
use dnsweave::config::{Config, Pipeline};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATIC_RECORDS: &str = r#"
records:
  - {type: A, name: nas.lan, address: 10.0.0.7}
  - {type: CNAME, name: files.lan, target: nas.lan.}
  - {type: AAAA, name: nas.lan, address: "fd00::7"}
"#;

fn config(path: &str, http_url: &str) -> Config {
    Config::parse(&format!(
        r"
interval: 1h
sources:
  - type: file
    name: static
    path: {path}
  - type: http
    url: {http_url}/records.json
modifiers:
  - type: filter
    filter:
      reject:
        match_fields:
          name: ignored.lan
  - type: autoptr
    filter:
      accept:
        match_expressions:
          - {{field: address, operator: InSubnet, values: [10.0.0.0/8]}}
sinks:
  - type: dnsserver
    listen_addr: 127.0.0.1:0
"
    ))
    .expect("valid configuration")
}

async fn http_source() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/records.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                {"type": "A", "name": "printer.lan", "address": "10.0.0.9"},
                {"type": "A", "name": "ignored.lan", "address": "10.0.0.10"}
            ]
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_full_cycle_answers_over_udp() {
    let file = records_file(STATIC_RECORDS);
    let upstream = http_source().await;
    let cfg = config(&file.path().display().to_string(), &upstream.uri());

    let Pipeline {
        mut orchestrator,
        mut sinks,
    } = Pipeline::build(cfg).await.expect("pipeline builds");
    let responder = sinks.responders.pop().expect("one responder");
    let addr = responder.local_addr().expect("bound address");
    let token = CancellationToken::new();
    let serving = tokio::spawn(responder.serve(token.clone()));

    let report = orchestrator.run_cycle(&token).await;
    assert!(report.error.is_none(), "cycle failed: {:?}", report.error);
    let published = report.published.expect("records published");
    // 3 static, 1 from http, 2 synthesized PTRs (the v6 address is outside the PTR filter)
    assert_eq!(published.len(), 6);

    let reply = query(addr, "files.lan.", RecordType::A).await;
    assert_eq!(reply.response_code(), ResponseCode::NoError);
    assert!(reply.header().authoritative());
    assert_eq!(
        answers(&reply),
        vec![
            ("files.lan.".to_string(), "nas.lan.".to_string()),
            ("nas.lan.".to_string(), "10.0.0.7".to_string()),
        ]
    );

    let reply = query(addr, "9.0.0.10.in-addr.arpa.", RecordType::PTR).await;
    assert_eq!(
        answers(&reply),
        vec![("9.0.0.10.in-addr.arpa.".to_string(), "printer.lan.".to_string())]
    );

    let reply = query(addr, "ignored.lan.", RecordType::A).await;
    assert!(reply.answers().is_empty());

    token.cancel();
    serving.await.expect("responder task");
}

#[tokio::test]
async fn test_second_cycle_reports_changes() {
    let file = records_file(STATIC_RECORDS);
    let upstream = http_source().await;
    let cfg = config(&file.path().display().to_string(), &upstream.uri());

    let Pipeline {
        mut orchestrator,
        mut sinks,
    } = Pipeline::build(cfg).await.expect("pipeline builds");
    let responder = sinks.responders.pop().expect("one responder");
    let addr = responder.local_addr().expect("bound address");
    let token = CancellationToken::new();
    let serving = tokio::spawn(responder.serve(token.clone()));

    orchestrator.run_cycle(&token).await;

    rewrite_records_file(
        &file,
        "records:\n  - {type: A, name: nas.lan, address: 10.0.0.8}\n",
    );
    let report = orchestrator.run_cycle(&token).await;
    let changes = report.changes.expect("baseline advanced");

    let added: Vec<String> = changes.added.iter().map(ToString::to_string).collect();
    assert_eq!(
        added,
        vec![
            "8.0.0.10.in-addr.arpa. IN PTR nas.lan.".to_string(),
            "nas.lan. IN A 10.0.0.8".to_string(),
        ]
    );
    assert_eq!(changes.removed.len(), 4);

    let reply = query(addr, "nas.lan.", RecordType::A).await;
    assert_eq!(
        answers(&reply),
        vec![("nas.lan.".to_string(), "10.0.0.8".to_string())]
    );
    let reply = query(addr, "files.lan.", RecordType::A).await;
    assert!(reply.answers().is_empty());

    token.cancel();
    serving.await.expect("responder task");
}

#[tokio::test]
async fn test_failing_source_keeps_others_published() {
    let file = records_file(STATIC_RECORDS);
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;
    let cfg = config(&file.path().display().to_string(), &upstream.uri());

    let Pipeline {
        mut orchestrator, ..
    } = Pipeline::build(cfg).await.expect("pipeline builds");

    let report = orchestrator.run_cycle(&CancellationToken::new()).await;
    let err = report.error.expect("http source failed");
    assert_eq!(err.failures.len(), 1);
    assert!(err.to_string().contains("source http."));
    // 3 static records plus the PTR for 10.0.0.7
    assert_eq!(report.published.expect("records published").len(), 4);
}
