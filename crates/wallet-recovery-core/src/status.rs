use std::sync::{Arc, Mutex};

use crate::domain::{TrackedTransaction, TxStatus};
use crate::hash_store::TxHashStore;
use crate::observable::Subscription;

/// Default redundant-poll interval while waiting for a signature.
pub const STATUS_POLL_INTERVAL_MS: u64 = 500;

fn is_signed(status: Option<TxStatus>) -> bool {
    matches!(status, Some(TxStatus::Pending) | Some(TxStatus::Success))
}

fn is_rejected(status: Option<TxStatus>) -> bool {
    matches!(status, Some(TxStatus::Cancelled) | Some(TxStatus::Error))
}

struct StatusInner {
    payload_id: String,
    waiting: bool,
    on_status_change: Box<dyn FnMut(bool) + Send>,
}

impl StatusInner {
    /// Re-derive from a status snapshot; a definitive status signals
    /// "no longer waiting" exactly once and stops the poll.
    fn evaluate(&mut self, status: Option<TxStatus>) -> bool {
        if !self.waiting {
            return false;
        }
        if is_signed(status) || is_rejected(status) {
            self.waiting = false;
            (self.on_status_change)(false);
            return false;
        }
        true
    }
}

/// UI-facing signed/rejected/final booleans for a single payload id,
/// derived from the transaction hash store.
///
/// Two redundant update paths, as in the original flow: a store
/// subscription (`attach`) fires on every mutation, and a host timer drives
/// `tick` at `interval_ms` while a signature is awaited.
pub struct TransactionStatusView {
    store: TxHashStore,
    inner: Arc<Mutex<StatusInner>>,
    pub interval_ms: u64,
}

impl TransactionStatusView {
    pub fn new(
        store: TxHashStore,
        payload_id: impl Into<String>,
        waiting_for_signature: bool,
        on_status_change: impl FnMut(bool) + Send + 'static,
    ) -> Self {
        let view = Self {
            store,
            inner: Arc::new(Mutex::new(StatusInner {
                payload_id: payload_id.into(),
                waiting: waiting_for_signature,
                on_status_change: Box::new(on_status_change),
            })),
            interval_ms: STATUS_POLL_INTERVAL_MS,
        };
        // Evaluate once on construction, matching the mount-time check.
        let status = view.current_status();
        view.lock().evaluate(status);
        view
    }

    /// Override the redundant-poll interval, typically from adapter config.
    pub fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatusInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current_status(&self) -> Option<TxStatus> {
        let id = self.lock().payload_id.clone();
        self.store.status(&id)
    }

    pub fn is_signed(&self) -> bool {
        is_signed(self.current_status())
    }

    pub fn is_rejected(&self) -> bool {
        is_rejected(self.current_status())
    }

    pub fn is_final(&self) -> bool {
        self.is_signed() || self.is_rejected()
    }

    pub fn is_waiting(&self) -> bool {
        self.lock().waiting
    }

    /// One redundant poll cycle. Returns false once a definitive status was
    /// observed and the interval should be cleared.
    pub fn tick(&self) -> bool {
        let status = self.current_status();
        self.lock().evaluate(status)
    }

    /// Subscribe the view to store mutations. The subscription derives from
    /// the mutated list directly, so it stays deadlock-free with respect to
    /// the store's own locks.
    pub fn attach(&self) -> Subscription {
        let inner = Arc::clone(&self.inner);
        self.store.subscribe(move |entries: &Vec<TrackedTransaction>| {
            let mut guard = inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let status = entries
                .iter()
                .find(|e| e.id.as_deref() == Some(guard.payload_id.as_str()))
                .and_then(|e| e.status);
            guard.evaluate(status);
        })
    }
}
