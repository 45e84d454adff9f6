use crate::domain::{TrackedTransaction, TrackedTransactionPatch, TxStatus};
use crate::observable::{Observable, Subscription};

/// Process-wide table mapping a logical recovery-payload id to its observed
/// on-chain transaction. All mutations are synchronous whole-list
/// replacements through the backing observable, so subscribers never see a
/// partially updated list. Entries live for the process lifetime unless
/// explicitly removed.
#[derive(Clone)]
pub struct TxHashStore {
    entries: Observable<Vec<TrackedTransaction>>,
}

impl Default for TxHashStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TxHashStore {
    pub fn new() -> Self {
        Self {
            entries: Observable::new(Vec::new()),
        }
    }

    /// Appends a new entry in `Preparing` state. Does not check for a
    /// pre-existing id; a duplicate `add` appends a duplicate entry.
    pub fn add(&self, id: &str, chain_id: Option<u64>) {
        let mut list = self.entries.get();
        list.push(TrackedTransaction {
            id: Some(id.to_owned()),
            hash: None,
            status: Some(TxStatus::Preparing),
            code: None,
            chain_id,
        });
        self.entries.set(list);
    }

    /// Shallow-merges `patch` into the first entry matching `id`. When no
    /// entry matches, the merge runs against an empty base and appends the
    /// resulting partial entry, keyed by `id`.
    pub fn update(&self, id: &str, patch: &TrackedTransactionPatch) {
        let mut list = self.entries.get();
        match list.iter_mut().find(|e| e.id.as_deref() == Some(id)) {
            Some(entry) => entry.apply(patch),
            None => {
                let mut entry = TrackedTransaction {
                    id: Some(id.to_owned()),
                    ..TrackedTransaction::default()
                };
                entry.apply(patch);
                list.push(entry);
            }
        }
        self.entries.set(list);
    }

    /// Deletes the first entry matching `id`.
    pub fn remove(&self, id: &str) {
        let mut list = self.entries.get();
        if let Some(pos) = list.iter().position(|e| e.id.as_deref() == Some(id)) {
            list.remove(pos);
            self.entries.set(list);
        }
    }

    /// Lookup by payload id, falling back to the first entry whose chain id
    /// matches when `key` parses as a decimal chain id and no id matches.
    /// The fallback is ambiguous when several in-flight payloads share a
    /// chain; callers that care must key by id.
    pub fn get(&self, key: &str) -> Option<TrackedTransaction> {
        let list = self.entries.get();
        if let Some(entry) = list.iter().find(|e| e.id.as_deref() == Some(key)) {
            return Some(entry.clone());
        }
        let chain_id: u64 = key.parse().ok()?;
        list.into_iter().find(|e| e.chain_id == Some(chain_id))
    }

    pub fn status(&self, key: &str) -> Option<TxStatus> {
        self.get(key).and_then(|e| e.status)
    }

    pub fn entries(&self) -> Vec<TrackedTransaction> {
        self.entries.get()
    }

    pub fn subscribe(
        &self,
        listener: impl FnMut(&Vec<TrackedTransaction>) + Send + 'static,
    ) -> Subscription {
        self.entries.subscribe(listener)
    }

    pub fn subscribe_now(
        &self,
        listener: impl FnMut(&Vec<TrackedTransaction>) + Send + 'static,
    ) -> Subscription {
        self.entries.subscribe_now(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    #[test]
    fn update_is_last_write_wins_per_id() {
        let store = TxHashStore::new();
        store.add("p1", Some(1));
        store.update(
            "p1",
            &TrackedTransactionPatch {
                hash: Some(B256::repeat_byte(0xaa)),
                status: Some(TxStatus::Pending),
                ..Default::default()
            },
        );
        store.update(
            "p1",
            &TrackedTransactionPatch {
                status: Some(TxStatus::Success),
                code: Some("0x1".to_owned()),
                ..Default::default()
            },
        );
        let entry = store.get("p1").expect("entry");
        assert_eq!(entry.hash, Some(B256::repeat_byte(0xaa)));
        assert_eq!(entry.status, Some(TxStatus::Success));
        assert_eq!(entry.code.as_deref(), Some("0x1"));
        assert_eq!(entry.chain_id, Some(1));
    }

    #[test]
    fn get_falls_back_to_chain_id_match() {
        let store = TxHashStore::new();
        store.add("p1", Some(137));
        assert!(store.get("p1").is_some());
        let by_chain = store.get("137").expect("chain fallback");
        assert_eq!(by_chain.id.as_deref(), Some("p1"));
        assert!(store.get("999").is_none());
        assert!(store.get("not-a-key").is_none());
    }

    #[test]
    fn update_on_missing_id_appends_partial_entry() {
        let store = TxHashStore::new();
        store.update(
            "ghost",
            &TrackedTransactionPatch {
                status: Some(TxStatus::Pending),
                ..Default::default()
            },
        );
        let entry = store.get("ghost").expect("partial entry");
        assert_eq!(entry.status, Some(TxStatus::Pending));
        assert_eq!(entry.chain_id, None);
        assert_eq!(entry.hash, None);
    }

    #[test]
    fn remove_deletes_first_match_only() {
        let store = TxHashStore::new();
        store.add("p1", Some(1));
        store.add("p1", Some(2));
        store.remove("p1");
        let remaining = store.entries();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].chain_id, Some(2));
    }

    #[test]
    fn duplicate_add_appends_duplicate_entry() {
        let store = TxHashStore::new();
        store.add("p1", Some(1));
        store.add("p1", Some(1));
        assert_eq!(store.entries().len(), 2);
    }
}
