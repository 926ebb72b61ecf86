// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `reconcile.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::record::{Record, RecordData, RecordType};
    use parking_lot::Mutex;
    use std::collections::HashSet;

    const MARKER: &str = "owned";

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Entry {
        id: u32,
        name: String,
        address: String,
        comment: String,
    }

    /// In-memory target with optional injected failures.
    struct MemTarget {
        entries: Mutex<Vec<Entry>>,
        next_id: Mutex<u32>,
        fail_add_for: HashSet<String>,
        fail_remove_ids: HashSet<u32>,
    }

    impl MemTarget {
        fn new(entries: Vec<Entry>) -> Self {
            Self {
                next_id: Mutex::new(100),
                entries: Mutex::new(entries),
                fail_add_for: HashSet::new(),
                fail_remove_ids: HashSet::new(),
            }
        }

        fn snapshot(&self) -> Vec<Entry> {
            self.entries.lock().clone()
        }
    }

    #[async_trait::async_trait]
    impl ReconcileTarget for MemTarget {
        type Entry = Entry;

        fn target_name(&self) -> &str {
            "memory"
        }

        fn supports(&self, rec: &Record) -> Result<bool, RecordError> {
            match rec.record_type() {
                RecordType::A | RecordType::AAAA => Ok(true),
                RecordType::PTR => Ok(false),
                other => Err(RecordError::UnsupportedType {
                    record_type: other.to_string(),
                    target: "memory".to_string(),
                }),
            }
        }

        fn is_owned(&self, entry: &Entry) -> bool {
            entry.comment == MARKER
        }

        fn matches(&self, rec: &Record, entry: &Entry) -> bool {
            rec.name == entry.name
                && rec.address().map(|a| a.to_string()).as_deref() == Some(entry.address.as_str())
        }

        async fn list(&self) -> anyhow::Result<Vec<Entry>> {
            Ok(self.snapshot())
        }

        async fn add(&self, rec: &Record) -> anyhow::Result<()> {
            if self.fail_add_for.contains(&rec.name) {
                anyhow::bail!("rejected");
            }
            let mut id = self.next_id.lock();
            *id += 1;
            self.entries.lock().push(Entry {
                id: *id,
                name: rec.name.clone(),
                address: rec.address().map(|a| a.to_string()).unwrap_or_default(),
                comment: MARKER.to_string(),
            });
            Ok(())
        }

        async fn remove(&self, entry: &Entry) -> anyhow::Result<()> {
            if self.fail_remove_ids.contains(&entry.id) {
                anyhow::bail!("locked");
            }
            self.entries.lock().retain(|e| e.id != entry.id);
            Ok(())
        }
    }

    fn entry(id: u32, name: &str, address: &str, comment: &str) -> Entry {
        Entry {
            id,
            name: name.to_string(),
            address: address.to_string(),
            comment: comment.to_string(),
        }
    }

    fn a(name: &str, addr: &str) -> Record {
        Record::new(name, RecordData::A(addr.parse().unwrap()))
    }

    #[test]
    fn test_reconcile_computes_minimal_plan() {
        let desired = vec![1, 2, 3];
        let observed = vec!["2", "3", "4"];
        let plan = reconcile(&desired, &observed, |d, o| d.to_string() == *o);

        assert_eq!(plan.to_add, vec![1]);
        assert_eq!(plan.to_remove, vec!["4"]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let desired = vec![a("a.lan.", "10.0.0.1"), a("b.lan.", "10.0.0.2")];
        let observed = vec![entry(1, "b.lan.", "10.0.0.2", MARKER), entry(2, "c.lan.", "10.0.0.3", MARKER)];
        let target = MemTarget::new(vec![]);
        let same = |r: &Record, e: &Entry| target.matches(r, e);

        let first = reconcile(&desired, &observed, same);
        let second = reconcile(&desired, &observed, same);
        assert_eq!(first, second);
        assert_eq!(first.to_add, vec![a("a.lan.", "10.0.0.1")]);
        assert_eq!(first.to_remove, vec![entry(2, "c.lan.", "10.0.0.3", MARKER)]);
    }

    #[test]
    fn test_reconcile_empty_inputs() {
        let plan = reconcile::<Record, Entry, _>(&[], &[], |_, _| true);
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_sync_converges() {
        let target = MemTarget::new(vec![
            entry(1, "stale.lan.", "10.0.0.9", MARKER),
            entry(2, "keep.lan.", "10.0.0.2", MARKER),
        ]);
        let records = vec![a("keep.lan.", "10.0.0.2"), a("new.lan.", "10.0.0.3")];

        let summary = sync(&target, &records).await.unwrap();
        assert_eq!(summary, SyncSummary { added: 1, removed: 1 });

        let observed = target.snapshot();
        let plan = reconcile(&records, &observed, |r, e| target.matches(r, e));
        assert!(plan.is_empty(), "second diff must be empty: {plan:?}");

        let again = sync(&target, &records).await.unwrap();
        assert_eq!(again, SyncSummary::default());
    }

    #[tokio::test]
    async fn test_sync_never_touches_foreign_entries() {
        let foreign = entry(1, "router.lan.", "10.0.0.1", "static by admin");
        let target = MemTarget::new(vec![foreign.clone()]);

        // Same name and address as the foreign entry: still added, foreign entry kept
        let records = vec![a("router.lan.", "10.0.0.1")];
        let summary = sync(&target, &records).await.unwrap();

        assert_eq!(summary, SyncSummary { added: 1, removed: 0 });
        assert!(target.snapshot().contains(&foreign));

        let summary = sync(&target, &[]).await.unwrap();
        assert_eq!(summary, SyncSummary { added: 0, removed: 1 });
        assert_eq!(target.snapshot(), vec![foreign]);
    }

    #[tokio::test]
    async fn test_sync_skips_unrepresentable_and_rejects_unsupported() {
        let target = MemTarget::new(vec![]);
        let ptr = Record::new(
            "1.0.0.10.in-addr.arpa.",
            RecordData::PTR {
                ptr: "a.lan.".to_string(),
            },
        );
        let summary = sync(&target, &[ptr, a("a.lan.", "10.0.0.1")]).await.unwrap();
        assert_eq!(summary.added, 1);

        let mx = Record::new(
            "lan.",
            RecordData::MX {
                preference: 10,
                mx: "mail.lan.".to_string(),
            },
        );
        let err = sync(&target, &[a("b.lan.", "10.0.0.2"), mx]).await.unwrap_err();
        assert!(err.downcast_ref::<RecordError>().is_some());
        // nothing applied when mapping fails
        assert_eq!(target.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_adds_host_reported_by_two_sources_once() {
        let target = MemTarget::new(vec![]);
        let records = vec![
            a("h.lan.", "10.0.0.5").with_source("file", "static"),
            a("h.lan.", "10.0.0.5").with_source("mikrotik_dhcp", "router"),
        ];

        let summary = sync(&target, &records).await.unwrap();
        assert_eq!(summary, SyncSummary { added: 1, removed: 0 });
        assert_eq!(target.snapshot().len(), 1);

        let again = sync(&target, &records).await.unwrap();
        assert_eq!(again, SyncSummary::default());
    }

    #[tokio::test]
    async fn test_sync_failures_do_not_block_batch() {
        let mut target = MemTarget::new(vec![
            entry(1, "old1.lan.", "10.0.1.1", MARKER),
            entry(2, "old2.lan.", "10.0.1.2", MARKER),
        ]);
        target.fail_remove_ids.insert(1);
        target.fail_add_for.insert("bad.lan.".to_string());

        let records = vec![a("bad.lan.", "10.0.0.1"), a("good.lan.", "10.0.0.2")];
        let err = sync(&target, &records).await.unwrap_err();
        let err = err.downcast_ref::<ReconcileError>().unwrap();

        assert_eq!(err.failed, 2);
        assert_eq!(err.attempted, 4);

        let names: Vec<String> = target.snapshot().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["old1.lan.".to_string(), "good.lan.".to_string()]);
    }
}
