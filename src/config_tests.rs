// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for configuration loading and validation.

#[cfg(test)]
mod tests {
    use crate::config::{duration_opt, Config, Pipeline};
    use crate::dns_errors::ConfigError;
    use serde::Deserialize;
    use std::io::Write;
    use std::time::Duration;

    const FULL: &str = r"
interval: 1m
http_listen_addr: 127.0.0.1:8080
sources:
  - type: file
    path: /etc/dnsweave/static.yaml
  - type: netbox
    url: http://netbox.lan
    token: abc
    timeout: 30s
modifiers:
  - type: filter
    filter:
      reject:
        match_fields:
          source_name: lab
  - type: autoptr
sinks:
  - type: dnsserver
    listen_addr: 127.0.0.1:0
  - type: http
  - type: dashboard
";

    #[test]
    fn test_parses_full_document() {
        let config = Config::parse(FULL).unwrap();
        assert_eq!(config.interval().unwrap(), Duration::from_secs(60));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.modifiers.len(), 2);
        assert_eq!(config.sinks.len(), 3);
        assert_eq!(
            config.http_listen_addr.unwrap().to_string(),
            "127.0.0.1:8080"
        );
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = Config::parse("interval: 0s\n").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroInterval));
    }

    #[test]
    fn test_unparsable_interval_is_rejected() {
        let err = Config::parse("interval: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInterval { .. }));
    }

    #[test]
    fn test_http_sink_requires_listen_addr() {
        let err = Config::parse("interval: 30s\nsinks:\n  - type: dashboard\n").unwrap_err();
        match err {
            ConfigError::MissingHttpListenAddr { sink } => assert_eq!(sink, "dashboard"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_conflicting_paths_are_rejected() {
        let doc = "interval: 30s\nhttp_listen_addr: 127.0.0.1:8080\nsinks:\n  - type: http\n    path: metrics\n";
        let err = Config::parse(doc).unwrap_err();
        match err {
            ConfigError::RouteConflict { path } => assert_eq!(path, "/metrics"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_filter_fails_at_load() {
        let doc = r"
interval: 30s
modifiers:
  - type: filter
    filter:
      accept:
        match_expressions:
          - {field: address, operator: InSubnet, values: [not-a-cidr]}
";
        assert!(matches!(
            Config::parse(doc).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn test_load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"interval: [").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path().display().to_string()),
            other => panic!("unexpected error: {other}"),
        }

        let missing = Config::load(std::path::Path::new("/nonexistent/dnsweave.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn test_duration_opt() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, with = "duration_opt")]
            timeout: Option<Duration>,
        }

        let set: Holder = serde_yaml::from_str("timeout: 1m30s").unwrap();
        assert_eq!(set.timeout, Some(Duration::from_secs(90)));
        let unset: Holder = serde_yaml::from_str("{}").unwrap();
        assert_eq!(unset.timeout, None);
        assert!(serde_yaml::from_str::<Holder>("timeout: later").is_err());
    }

    #[tokio::test]
    async fn test_pipeline_build() {
        let doc = r"
interval: 5s
http_listen_addr: 127.0.0.1:8080
sources:
  - type: file
    path: /nonexistent.yaml
modifiers:
  - type: autoptr
sinks:
  - type: dnsserver
    listen_addr: 127.0.0.1:0
  - type: dashboard
";
        let pipeline = Pipeline::build(Config::parse(doc).unwrap()).await.unwrap();
        assert_eq!(pipeline.orchestrator.interval(), Duration::from_secs(5));
        assert!(pipeline.sinks.sinks.is_empty());
        assert_eq!(pipeline.sinks.responders.len(), 1);
    }
}
