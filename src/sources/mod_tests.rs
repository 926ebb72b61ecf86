// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for source configuration decoding.

#[cfg(test)]
mod tests {
    use crate::record::{Record, RecordData};
    use crate::sources::*;
    use std::time::Duration;

    fn decode(yaml: &str) -> SourceConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_type_tag_selects_adapter() {
        let cases = [
            ("type: file\npath: /tmp/records.yaml\n", "file"),
            ("type: http\nurl: http://inventory.lan/records\n", "http"),
            ("type: mikrotik_dhcp\nurl: http://router.lan\nuser: u\npassword: p\n", "mikrotik_dhcp"),
            ("type: netbox\nurl: http://netbox.lan\ntoken: t\n", "netbox"),
            ("type: traefik\nurl: http://traefik.lan:8080\n", "traefik"),
        ];
        for (yaml, expected) in cases {
            let source = decode(yaml).build().unwrap();
            assert_eq!(source.source_type(), expected);
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(serde_yaml::from_str::<SourceConfig>("type: ldap\nurl: x\n").is_err());
    }

    #[test]
    fn test_name_defaults_to_location() {
        let source = decode("type: http\nurl: http://inventory.lan/records\n")
            .build()
            .unwrap();
        assert_eq!(source.name(), "http://inventory.lan/records");

        let source = decode("type: http\nname: inventory\nurl: http://inventory.lan/records\n")
            .build()
            .unwrap();
        assert_eq!(source.name(), "inventory");
    }

    #[test]
    fn test_timeout_option() {
        let source = decode("type: file\npath: /tmp/x.yaml\n").build().unwrap();
        assert_eq!(source.timeout(), Duration::from_secs(10));

        let source = decode("type: file\npath: /tmp/x.yaml\ntimeout: 2s\n")
            .build()
            .unwrap();
        assert_eq!(source.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_filter_fails_decoding() {
        let yaml = "type: file\npath: /tmp/x.yaml\nfilter:\n  accept:\n    match_fields:\n      colour: red\n";
        assert!(serde_yaml::from_str::<SourceConfig>(yaml).is_err());
    }

    #[test]
    fn test_apply_filter_keeps_order() {
        let filter: crate::filter::RecordFilter =
            serde_yaml::from_str("reject:\n  match_fields:\n    name: b.lan\n").unwrap();
        let records = vec![
            Record::new("a.lan", RecordData::A("10.0.0.1".parse().unwrap())),
            Record::new("b.lan", RecordData::A("10.0.0.2".parse().unwrap())),
            Record::new("c.lan", RecordData::A("10.0.0.3".parse().unwrap())),
        ];

        let kept = apply_filter("file", "test", &filter, records);
        let names: Vec<_> = kept.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a.lan.", "c.lan."]);
    }
}
