// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `record.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_name_appends_dot_once() {
        assert_eq!(normalize_name("example.com"), "example.com.");
        assert_eq!(normalize_name("example.com."), "example.com.");
    }

    #[test]
    fn test_record_type_parse_is_case_insensitive() {
        assert_eq!("aaaa".parse::<RecordType>().unwrap(), RecordType::AAAA);
        assert_eq!("Cname".parse::<RecordType>().unwrap(), RecordType::CNAME);
        assert!(matches!(
            "TXT".parse::<RecordType>(),
            Err(RecordError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_display_matches_zone_file_style() {
        let srv = Record::new(
            "_http._tcp.example.com",
            RecordData::SRV {
                priority: 10,
                weight: 5,
                port: 80,
                target: "web.example.com.".to_string(),
            },
        );
        assert_eq!(
            srv.to_string(),
            "_http._tcp.example.com. IN SRV 10 5 80 web.example.com."
        );

        let mx = Record::new(
            "example.com.",
            RecordData::MX {
                preference: 10,
                mx: "mail.example.com.".to_string(),
            },
        );
        assert_eq!(mx.to_string(), "example.com. IN MX 10 mail.example.com.");
    }

    #[test]
    fn test_provenance_is_part_of_identity() {
        let a = Record::new("a.example.", RecordData::A("10.0.0.1".parse().unwrap()))
            .with_source("file", "/etc/records.yaml");
        let b = a.clone().with_source("http", "http://inventory/records");

        assert_ne!(a, b);
        let set: HashSet<_> = [a.clone(), b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_decode_yaml_normalizes_names() {
        let doc = r"
records:
  - type: A
    name: host.lan
    address: 192.168.1.10
  - type: CNAME
    name: www.lan
    target: host.lan
  - type: SRV
    name: _ssh._tcp.lan
    target: host.lan
    port: 22
";
        let list: RecordList = serde_yaml::from_str(doc).unwrap();
        assert_eq!(list.records.len(), 3);
        assert_eq!(list.records[0].name, "host.lan.");
        assert_eq!(
            list.records[1].data,
            RecordData::CNAME {
                target: "host.lan.".to_string()
            }
        );
        assert_eq!(
            list.records[2].data,
            RecordData::SRV {
                priority: 0,
                weight: 0,
                port: 22,
                target: "host.lan.".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_family_mismatch() {
        let json = r#"{"type":"A","name":"a.example.","address":"fd00::1"}"#;
        let err = serde_json::from_str::<Record>(json).unwrap_err();
        assert!(err.to_string().contains("invalid address 'fd00::1'"));
    }

    #[test]
    fn test_decode_rejects_mixed_payload() {
        let raw = RawRecord {
            record_type: "CNAME".to_string(),
            name: "a.example.".to_string(),
            target: Some("b.example.".to_string()),
            address: Some("10.0.0.1".to_string()),
            ..RawRecord::default()
        };
        assert_eq!(
            Record::try_from(raw),
            Err(RecordError::UnexpectedField {
                record_type: "CNAME".to_string(),
                name: "a.example.".to_string(),
                field: "address",
            })
        );
    }

    #[test]
    fn test_decode_rejects_missing_payload_and_empty_name() {
        let raw = RawRecord {
            record_type: "PTR".to_string(),
            name: "1.0.0.10.in-addr.arpa.".to_string(),
            ..RawRecord::default()
        };
        assert!(matches!(
            Record::try_from(raw),
            Err(RecordError::MissingField { field: "ptr", .. })
        ));

        let raw = RawRecord {
            record_type: "A".to_string(),
            name: "  ".to_string(),
            address: Some("10.0.0.1".to_string()),
            ..RawRecord::default()
        };
        assert_eq!(Record::try_from(raw), Err(RecordError::EmptyName));
    }

    #[test]
    fn test_encode_uses_flat_shape() {
        let rec = Record::new("a.example.", RecordData::A("10.0.0.1".parse().unwrap()))
            .with_source("file", "records.yaml");
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "A",
                "name": "a.example.",
                "source": "file",
                "source_name": "records.yaml",
                "address": "10.0.0.1"
            })
        );
    }

    #[test]
    fn test_retain_fields_for_clears_foreign_payload() {
        let mut raw: RawRecord = Record::new(
            "a.example.",
            RecordData::SRV {
                priority: 1,
                weight: 2,
                port: 3,
                target: "t.example.".to_string(),
            },
        )
        .into();
        raw.record_type = "CNAME".to_string();
        raw.retain_fields_for(RecordType::CNAME);

        let rec = Record::try_from(raw).unwrap();
        assert_eq!(
            rec.data,
            RecordData::CNAME {
                target: "t.example.".to_string()
            }
        );
    }

    #[test]
    fn test_from_ip_picks_family() {
        assert_eq!(
            RecordData::from_ip("10.1.2.3".parse().unwrap()).record_type(),
            RecordType::A
        );
        assert_eq!(
            RecordData::from_ip("2001:db8::1".parse().unwrap()).record_type(),
            RecordType::AAAA
        );
    }
}
