use alloy::primitives::{Address, U256};
use tracing::{debug, warn};

use crate::domain::{Call, HandlerKind, SignatureRequest, SignerState, TransactionState};
use crate::ports::{ManagerPort, PortError, SOURCE_RECOVERY_PAYLOAD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteOutcome {
    Ignored,
    Relayed,
    Cancelled,
}

struct PendingRelay {
    tx_id: String,
    request_id: String,
}

/// Execute-recovery flow: once a queued payload's lock window has elapsed,
/// builds the completing transaction through the manager, anchors it to the
/// original nonce slot, and relays it when the recovery-extension signer
/// reports ready.
pub struct ExecuteRecoveryFlow<M>
where
    M: ManagerPort,
{
    manager: M,
    on_cancel: Box<dyn FnMut(&str) + Send>,
    pending: Option<PendingRelay>,
}

impl<M> ExecuteRecoveryFlow<M>
where
    M: ManagerPort,
{
    pub fn new(manager: M, on_cancel: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            manager,
            on_cancel: Box::new(on_cancel),
            pending: None,
        }
    }

    /// Request, define and prepare relay of the completing transaction.
    /// Defining to the original `(nonce, space)` anchors the transaction to
    /// the queued payload's nonce slot, so it fulfills the payload instead
    /// of creating a disjoint transaction. Returns the manager transaction
    /// id for status tracking.
    pub fn execute(
        &mut self,
        wallet: Address,
        calls: &[Call],
        space: U256,
        nonce: u64,
        chain_id: u64,
        provider_unique_id: &str,
    ) -> Result<String, PortError> {
        let tx_id = self
            .manager
            .request_transaction(wallet, chain_id, calls, SOURCE_RECOVERY_PAYLOAD)?;
        self.manager.define_transaction(&tx_id, nonce, space)?;

        let state = self.manager.transaction_state(&tx_id)?;
        if state != TransactionState::Defined {
            self.manager.delete_transaction(&tx_id)?;
            return Err(PortError::Validation(
                "Transaction not found or unexpected status".to_owned(),
            ));
        }

        let options = self.manager.relayer_options(&tx_id)?;
        let selected = options
            .iter()
            .find(|o| o.relayer_id.as_deref() == Some(provider_unique_id))
            .or_else(|| {
                options.iter().find(|o| {
                    o.kind == crate::domain::RelayerKind::Standard && !o.fee_required
                })
            });
        let Some(option) = selected else {
            self.manager.delete_transaction(&tx_id)?;
            return Err(PortError::Validation(
                "No free relayer options found".to_owned(),
            ));
        };

        let request_id = self.manager.select_relayer(&tx_id, &option.option_id)?;
        debug!(tx_id, request_id, option = option.option_id, "relayer selected");
        self.pending = Some(PendingRelay {
            tx_id: tx_id.clone(),
            request_id,
        });
        Ok(tx_id)
    }

    pub fn pending_request_id(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.request_id.as_str())
    }

    /// React to a signature-request update for the pending relay. When the
    /// recovery-extension signer is ready, handle it and relay. A code-4001
    /// relay failure deletes the transaction and fires the cancellation
    /// callback; other relay failures propagate.
    pub fn on_signature_request_update(
        &mut self,
        update: &SignatureRequest,
    ) -> Result<ExecuteOutcome, PortError> {
        let Some(pending) = self.pending.as_ref() else {
            return Ok(ExecuteOutcome::Ignored);
        };
        if pending.request_id != update.request_id {
            return Ok(ExecuteOutcome::Ignored);
        }
        let Some(signer) = update.signers.iter().find(|s| {
            s.handler_kind == HandlerKind::RecoveryExtension && s.state == SignerState::Ready
        }) else {
            return Ok(ExecuteOutcome::Ignored);
        };
        let tx_id = pending.tx_id.clone();

        if let Err(e) = self.manager.handle_signer(&update.request_id, signer.address) {
            warn!(tx_id, error = %e, "recovery-extension signer handle failed");
        }
        match self.manager.relay(&tx_id) {
            Ok(()) => {
                debug!(tx_id, "recovery transaction relayed");
                self.pending = None;
                Ok(ExecuteOutcome::Relayed)
            }
            Err(e) if e.is_user_rejection() => {
                self.manager.delete_transaction(&tx_id)?;
                (self.on_cancel)("cancelled");
                self.pending = None;
                Ok(ExecuteOutcome::Cancelled)
            }
            Err(e) => Err(e),
        }
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }
}
