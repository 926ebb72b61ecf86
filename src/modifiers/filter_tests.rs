// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the filter modifier.

#[cfg(test)]
mod tests {
    use crate::filter::RecordFilter;
    use crate::modifiers::filter::FilterModifier;
    use crate::modifiers::Modifier;
    use crate::record::{Record, RecordData};

    #[test]
    fn test_keeps_matching_records_in_order() {
        let filter: RecordFilter = serde_yaml::from_str(
            "accept:\n  match_expressions:\n    - {field: address, operator: InSubnet, values: [10.0.0.0/8]}\n",
        )
        .unwrap();
        let records = vec![
            Record::new("a.lan", RecordData::A("10.1.1.1".parse().unwrap())),
            Record::new("b.lan", RecordData::A("192.168.1.1".parse().unwrap())),
            Record::new(
                "c.lan",
                RecordData::CNAME {
                    target: "a.lan.".to_string(),
                },
            ),
            Record::new("d.lan", RecordData::A("10.2.2.2".parse().unwrap())),
        ];

        let kept = FilterModifier::new(filter).modify(records).unwrap();
        let names: Vec<_> = kept.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a.lan.", "d.lan."]);
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let records = vec![Record::new("a.lan", RecordData::A("10.1.1.1".parse().unwrap()))];
        let kept = FilterModifier::new(RecordFilter::default())
            .modify(records.clone())
            .unwrap();
        assert_eq!(kept, records);
    }
}
