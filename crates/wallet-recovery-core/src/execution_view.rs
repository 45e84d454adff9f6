use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::primitives::B256;

use crate::domain::{QueuedRecoveryPayload, TransactionState, TransactionUpdate};
use crate::execute_flow::ExecuteRecoveryFlow;
use crate::ports::{ManagerPort, PortError};

/// Per-queued-payload UI state: already-executed detection plus the live
/// status of a relayed completing transaction.
pub struct PayloadExecutionView {
    payload: QueuedRecoveryPayload,
    pending: Arc<AtomicBool>,
    tx_id: Option<String>,
    hash: Option<B256>,
    state: Option<TransactionState>,
}

impl PayloadExecutionView {
    pub fn new(payload: QueuedRecoveryPayload) -> Self {
        Self {
            payload,
            pending: Arc::new(AtomicBool::new(false)),
            tx_id: None,
            hash: None,
            state: None,
        }
    }

    pub fn payload(&self) -> &QueuedRecoveryPayload {
        &self.payload
    }

    /// A payload is executed once the wallet's on-chain nonce for its
    /// `(chain, wallet, space)` slot has moved past the payload's nonce.
    pub fn refresh_executed<M: ManagerPort>(&self, manager: &M) -> Result<bool, PortError> {
        let current = manager.get_nonce(
            self.payload.chain_id,
            self.payload.wallet,
            self.payload.envelope.space,
        )?;
        Ok(current > self.payload.envelope.nonce)
    }

    /// Cancellation hook for the execute flow. User rejection is the only
    /// path that clears the pending flag; other terminal outcomes leave it
    /// set.
    pub fn cancel_handle(&self) -> impl FnMut(&str) + Send + 'static {
        let pending = Arc::clone(&self.pending);
        move |_reason| {
            pending.store(false, Ordering::SeqCst);
        }
    }

    /// Drive the execute-recovery flow for this payload and retain the
    /// resulting transaction id for update tracking.
    pub fn start_execute<M: ManagerPort>(
        &mut self,
        flow: &mut ExecuteRecoveryFlow<M>,
        provider_unique_id: &str,
    ) -> Result<String, PortError> {
        self.pending.store(true, Ordering::SeqCst);
        let tx_id = flow.execute(
            self.payload.wallet,
            &self.payload.envelope.calls,
            self.payload.envelope.space,
            self.payload.envelope.nonce,
            self.payload.chain_id,
            provider_unique_id,
        )?;
        self.tx_id = Some(tx_id.clone());
        Ok(tx_id)
    }

    /// Map a manager transaction update onto the view. The hash is exposed
    /// only for a final, confirmed transaction, so consumers never see a
    /// stale hash for a non-final one.
    pub fn on_transaction_update(&mut self, update: &TransactionUpdate) {
        if self.tx_id.as_deref() != Some(update.tx_id.as_str()) {
            return;
        }
        self.state = Some(update.state);
        self.hash = if update.state == TransactionState::Final && update.op_confirmed {
            update.hash
        } else {
            None
        };
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn tx_id(&self) -> Option<&str> {
        self.tx_id.as_deref()
    }

    pub fn hash(&self) -> Option<B256> {
        self.hash
    }

    pub fn state(&self) -> Option<TransactionState> {
        self.state
    }
}
