use tracing::{debug, warn};

use crate::domain::{TrackedTransactionPatch, TxStatus};
use crate::hash_store::TxHashStore;
use crate::ports::ProviderPort;

pub const RECEIPT_MAX_ATTEMPTS: u32 = 20;
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Poller inactive or the tracked entry already reached a stop status.
    Stopped,
    /// No entry, hash or receipt yet; run another cycle after `interval_ms`.
    Rescheduled,
    /// A receipt resolved the transaction to the given status.
    Resolved(TxStatus),
    /// The retry budget ran out; the entry was marked `Timeout`.
    TimedOut,
}

/// Background receipt poller for one tracked payload id. The host drives
/// `tick` from a timer at `interval_ms`; tests call it directly. One
/// poller runs at most one loop, guarded by the `active` flag.
pub struct ReceiptPoller {
    payload_id: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub interval_ms: u64,
    active: bool,
}

impl ReceiptPoller {
    pub fn new(payload_id: impl Into<String>) -> Self {
        Self::with_limits(payload_id, RECEIPT_MAX_ATTEMPTS, RECEIPT_POLL_INTERVAL_MS)
    }

    /// Poller with custom retry limits, for config-driven hosts.
    pub fn with_limits(
        payload_id: impl Into<String>,
        max_attempts: u32,
        interval_ms: u64,
    ) -> Self {
        Self {
            payload_id: payload_id.into(),
            attempts: 0,
            max_attempts,
            interval_ms,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// One polling cycle against the tracked entry's hash.
    ///
    /// Receipt status `0x1` maps to `Success`, `0x0` to `Failed`, anything
    /// else to `Cancelled`. Provider errors mark the entry `Cancelled` and
    /// stop; transient and permanent failures are not distinguished here.
    pub fn tick<P: ProviderPort>(&mut self, store: &TxHashStore, provider: &P) -> PollOutcome {
        if !self.active {
            return PollOutcome::Stopped;
        }
        if let Some(status) = store.status(&self.payload_id) {
            if status.stops_polling() {
                self.active = false;
                return PollOutcome::Stopped;
            }
        }

        self.attempts += 1;
        let hash = store.get(&self.payload_id).and_then(|e| e.hash);
        let Some(hash) = hash else {
            return self.unresolved_cycle(store);
        };

        match provider.transaction_receipt(hash) {
            Ok(Some(receipt)) => {
                let status = match receipt.status.as_str() {
                    "0x1" => TxStatus::Success,
                    "0x0" => TxStatus::Failed,
                    _ => TxStatus::Cancelled,
                };
                debug!(
                    payload_id = self.payload_id,
                    %hash,
                    code = receipt.status,
                    ?status,
                    "receipt resolved"
                );
                store.update(
                    &self.payload_id,
                    &TrackedTransactionPatch {
                        hash: Some(hash),
                        status: Some(status),
                        code: Some(receipt.status),
                        ..Default::default()
                    },
                );
                self.active = false;
                PollOutcome::Resolved(status)
            }
            Ok(None) => self.unresolved_cycle(store),
            Err(e) => {
                // Absorbed into store state; the poller never throws.
                warn!(payload_id = self.payload_id, error = %e, "receipt request failed");
                self.mark(store, TxStatus::Cancelled);
                self.active = false;
                PollOutcome::Resolved(TxStatus::Cancelled)
            }
        }
    }

    fn unresolved_cycle(&mut self, store: &TxHashStore) -> PollOutcome {
        if self.attempts >= self.max_attempts {
            self.mark(store, TxStatus::Timeout);
            self.active = false;
            return PollOutcome::TimedOut;
        }
        PollOutcome::Rescheduled
    }

    fn mark(&self, store: &TxHashStore, status: TxStatus) {
        store.update(
            &self.payload_id,
            &TrackedTransactionPatch {
                status: Some(status),
                ..Default::default()
            },
        );
    }
}
