// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the rewrite modifier.

#[cfg(test)]
mod tests {
    use crate::modifiers::rewrite::{RewriteConfig, RewriteModifier};
    use crate::modifiers::Modifier;
    use crate::record::{Record, RecordData};

    fn modifier(yaml: &str) -> RewriteModifier {
        RewriteModifier::new(serde_yaml::from_str::<RewriteConfig>(yaml).unwrap()).unwrap()
    }

    fn a(name: &str, addr: &str) -> Record {
        Record::new(name, RecordData::A(addr.parse().unwrap())).with_source("file", "static")
    }

    #[test]
    fn test_rewrites_name_of_matching_records() {
        let m = modifier(
            r#"
filter:
  accept:
    match_expressions:
      - {field: name, operator: HasSuffix, values: ["docker."]}
name: "{{ record.name | replace(from='.docker.', to='.lan') }}"
"#,
        );
        let out = m
            .modify(vec![a("web.docker.", "172.17.0.2"), a("db.lan.", "10.0.0.3")])
            .unwrap();

        assert_eq!(out[0].name, "web.lan.");
        assert_eq!(out[0].source, "file", "provenance survives the rewrite");
        assert_eq!(out[1], a("db.lan.", "10.0.0.3"));
    }

    #[test]
    fn test_type_change_clears_old_payload() {
        let m = modifier(
            r#"
record_type: CNAME
target: "ingress.lan"
"#,
        );
        let out = m.modify(vec![a("app.lan", "10.0.0.9")]).unwrap();

        assert_eq!(
            out[0].data,
            RecordData::CNAME {
                target: "ingress.lan.".to_string()
            }
        );
    }

    #[test]
    fn test_later_templates_see_earlier_results() {
        let m = modifier(
            r#"
record_type: SRV
target: "{{ record.name }}"
priority: "10"
weight: "{{ 2 * 5 }}"
port: "8443"
"#,
        );
        let out = m.modify(vec![a("api.lan", "10.0.0.9")]).unwrap();

        assert_eq!(
            out[0].data,
            RecordData::SRV {
                priority: 10,
                weight: 10,
                port: 8443,
                target: "api.lan.".to_string(),
            }
        );
    }

    #[test]
    fn test_address_rewrite_is_revalidated() {
        let m = modifier("address: \"{{ record.address | replace(from='10.', to='fd00::') }}\"\n");
        let err = m.modify(vec![a("x.lan", "10.0.0.1")]).unwrap_err();
        assert!(format!("{err:#}").contains("invalid address"));
    }

    #[test]
    fn test_invalid_number_fails() {
        let m = modifier("record_type: MX\nmx: mail.lan\npreference: high\n");
        let err = m.modify(vec![a("lan", "10.0.0.1")]).unwrap_err();
        assert!(format!("{err:#}").contains("preference"));
    }

    #[test]
    fn test_undefined_variable_fails() {
        let m = modifier("target: \"{{ record.target }}\"\n");
        assert!(m.modify(vec![a("x.lan", "10.0.0.1")]).is_err());
    }

    #[test]
    fn test_empty_input() {
        let m = modifier("name: \"{{ record.name }}\"\n");
        assert!(m.modify(Vec::new()).unwrap().is_empty());
    }
}
