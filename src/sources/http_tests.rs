// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the HTTP source.

#[cfg(test)]
mod tests {
    use crate::sources::http::{HttpSource, HttpSourceConfig};
    use crate::sources::{Source, SourceOptions};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/records.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    fn source(server: &MockServer, keep_original_source: bool) -> HttpSource {
        HttpSource::new(HttpSourceConfig {
            url: format!("{}/records.json", server.uri()),
            keep_original_source,
            options: SourceOptions {
                name: Some("inventory".to_string()),
                ..SourceOptions::default()
            },
        })
        .unwrap()
    }

    fn document() -> serde_json::Value {
        json!({
            "records": [
                {"type": "A", "name": "db.lan", "address": "10.0.0.5"},
                {"type": "MX", "name": "lan", "preference": 10, "mx": "mail.lan",
                 "source": "upstream", "source_name": "primary"}
            ]
        })
    }

    #[tokio::test]
    async fn test_stamps_provenance_by_default() {
        let server = serve(document()).await;
        let records = source(&server, false)
            .read(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r.source == "http" && r.source_name == "inventory"));
        assert_eq!(records[0].name, "db.lan.");
    }

    #[tokio::test]
    async fn test_keeps_upstream_provenance_when_asked() {
        let server = serve(document()).await;
        let records = source(&server, true)
            .read(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records[0].source, "http");
        assert_eq!(records[1].source, "upstream");
        assert_eq!(records[1].source_name, "primary");
    }

    #[tokio::test]
    async fn test_filter_matches_upstream_provenance() {
        let server = serve(document()).await;
        let mut cfg = HttpSourceConfig {
            url: format!("{}/records.json", server.uri()),
            keep_original_source: false,
            options: SourceOptions {
                name: Some("inventory".to_string()),
                ..SourceOptions::default()
            },
        };
        cfg.options.filter =
            serde_yaml::from_str("accept:\n  match_fields:\n    source: upstream\n").unwrap();

        let records = HttpSource::new(cfg)
            .unwrap()
            .read(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "lan.");
        assert_eq!(records[0].source, "http");
        assert_eq!(records[0].source_name, "inventory");
    }

    #[tokio::test]
    async fn test_server_error_fails_read() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = source(&server, false)
            .read(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("boom"));
    }

    #[tokio::test]
    async fn test_invalid_document_fails_read() {
        let server = serve(json!({"records": [{"type": "TXT", "name": "x.lan"}]})).await;
        assert!(source(&server, false)
            .read(&CancellationToken::new())
            .await
            .is_err());
    }
}
