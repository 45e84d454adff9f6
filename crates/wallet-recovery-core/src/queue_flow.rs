use std::collections::{HashMap, HashSet};

use alloy::primitives::{Address, U256};
use tracing::{debug, warn};

use crate::calls::build_transfer_call;
use crate::domain::{
    Call, PayloadEnvelope, PayloadKind, SignatureRequest, SignerState, TokenRecord,
    TrackedTransactionPatch, TransactionRequest, TxStatus,
};
use crate::hash_store::TxHashStore;
use crate::ports::{EntropyPort, ManagerPort, PortError, ProviderPort, USER_REJECTED_CODE};

struct PendingDispatch {
    external_wallet: Address,
    chain_id: u64,
}

/// Queue-payload flow: turns token records plus a destination into a
/// queued, time-locked recovery payload, and dispatches the completing
/// transaction once the wallet signer becomes actionable.
///
/// Signature-request updates arrive at-least-once from the manager; the
/// completed-ids set guards the completion path so a re-delivered update
/// cannot send twice.
pub struct QueuePayloadFlow<M, P, E>
where
    M: ManagerPort,
    P: ProviderPort,
    E: EntropyPort,
{
    manager: M,
    provider: P,
    entropy: E,
    store: TxHashStore,
    wallet_signer: Address,
    pending: HashMap<String, PendingDispatch>,
    completed: HashSet<String>,
    on_mnemonic_release: Option<Box<dyn FnMut() + Send>>,
}

impl<M, P, E> QueuePayloadFlow<M, P, E>
where
    M: ManagerPort,
    P: ProviderPort,
    E: EntropyPort,
{
    pub fn new(
        manager: M,
        provider: P,
        entropy: E,
        store: TxHashStore,
        wallet_signer: Address,
    ) -> Self {
        Self {
            manager,
            provider,
            entropy,
            store,
            wallet_signer,
            pending: HashMap::new(),
            completed: HashSet::new(),
            on_mnemonic_release: None,
        }
    }

    /// Callers blocked on mnemonic availability are released through this
    /// notifier once the signature handling is registered.
    pub fn set_mnemonic_release(&mut self, notify: impl FnMut() + Send + 'static) {
        self.on_mnemonic_release = Some(Box::new(notify));
    }

    /// Build one transfer call per token record. `overrides` replaces the
    /// full-balance default per position.
    pub fn build_recovery_calls(
        records: &[TokenRecord],
        wallet: Address,
        recipient: Address,
        overrides: &[Option<U256>],
    ) -> Result<Vec<Call>, PortError> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let amount = overrides.get(i).copied().flatten();
                build_transfer_call(record, wallet, recipient, amount)
            })
            .collect()
    }

    /// Queue a recovery payload against the wallet's recovery module and
    /// track it for receipt polling. Returns the manager's payload id.
    ///
    /// A payload that queues but whose signature registration later fails
    /// is not rolled back; it remains queued on-chain.
    #[allow(clippy::too_many_arguments)]
    pub fn queue_recovery(
        &mut self,
        external_wallet: Option<Address>,
        account: Option<Address>,
        wallet: Address,
        chain_id: u64,
        records: &[TokenRecord],
        recipient: Address,
        overrides: &[Option<U256>],
    ) -> Result<String, PortError> {
        let external_wallet = external_wallet.ok_or_else(|| {
            PortError::Validation("No external wallet address selected".to_owned())
        })?;
        let _account =
            account.ok_or_else(|| PortError::Validation("No account address found".to_owned()))?;

        let calls = Self::build_recovery_calls(records, wallet, recipient, overrides)?;
        let envelope = PayloadEnvelope {
            kind: PayloadKind::Call,
            space: self.entropy.random_space()?,
            nonce: 0,
            calls,
        };
        let payload_id = self.manager.queue_payload(wallet, chain_id, &envelope)?;
        debug!(%wallet, chain_id, payload_id, "recovery payload queued");

        self.pending.insert(
            payload_id.clone(),
            PendingDispatch {
                external_wallet,
                chain_id,
            },
        );
        self.store.add(&payload_id, Some(chain_id));

        if let Some(notify) = self.on_mnemonic_release.as_mut() {
            notify();
        }
        Ok(payload_id)
    }

    /// React to a manager signature-request update for a queued payload.
    /// When the wallet signer is actionable and the payload has not been
    /// completed yet, handle the signer, complete the payload, and dispatch
    /// the completing transaction through the external wallet. Returns true
    /// when a dispatch was attempted.
    ///
    /// Send failures are absorbed into the hash store (4001 maps to
    /// `Cancelled`, anything else to `Error`); only manager completion
    /// failures propagate.
    pub fn on_signature_request_update(
        &mut self,
        payload_id: &str,
        update: &SignatureRequest,
    ) -> Result<bool, PortError> {
        if self.completed.contains(payload_id) {
            return Ok(false);
        }
        let Some(signer) = update
            .signers
            .iter()
            .find(|s| s.address == self.wallet_signer && s.state == SignerState::Actionable)
        else {
            return Ok(false);
        };
        let Some(dispatch) = self.pending.get(payload_id) else {
            return Ok(false);
        };
        let external_wallet = dispatch.external_wallet;
        let chain_id = dispatch.chain_id;

        // Guard before dispatch: a re-delivered actionable signer must not
        // trigger a second completion.
        self.completed.insert(payload_id.to_owned());

        if let Err(e) = self.manager.handle_signer(&update.request_id, signer.address) {
            warn!(payload_id, error = %e, "signer handle failed");
        }
        let completed = self.manager.complete_payload(payload_id)?;

        let request = TransactionRequest {
            from: external_wallet,
            to: completed.to,
            value: U256::ZERO,
            data: completed.data,
            chain_id,
        };
        match self.provider.send_transaction(&request) {
            Ok(hash) => {
                debug!(payload_id, %hash, "completing transaction sent");
                self.store.update(
                    payload_id,
                    &TrackedTransactionPatch {
                        hash: Some(hash),
                        status: Some(TxStatus::Pending),
                        ..Default::default()
                    },
                );
            }
            Err(e) if e.is_user_rejection() => {
                self.store.update(
                    payload_id,
                    &TrackedTransactionPatch {
                        status: Some(TxStatus::Cancelled),
                        code: Some(USER_REJECTED_CODE.to_string()),
                        ..Default::default()
                    },
                );
            }
            Err(e) => {
                warn!(payload_id, error = %e, "completing transaction send failed");
                let code = match &e {
                    PortError::Rpc { code, .. } => code.to_string(),
                    _ => "send_failed".to_owned(),
                };
                self.store.update(
                    payload_id,
                    &TrackedTransactionPatch {
                        status: Some(TxStatus::Error),
                        code: Some(code),
                        ..Default::default()
                    },
                );
            }
        }
        Ok(true)
    }

    pub fn is_completed(&self, payload_id: &str) -> bool {
        self.completed.contains(payload_id)
    }

    pub fn store(&self) -> &TxHashStore {
        &self.store
    }
}
