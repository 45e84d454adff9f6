use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, Bytes, U256};
use tracing::debug;

use wallet_recovery_core::{
    Call, CompletedPayload, ManagerPort, PayloadEnvelope, PortError, RelayerKind, RelayerOption,
    SignatureRequest, TransactionState, TransactionUpdate,
};

#[derive(Debug, Clone)]
struct QueuedPayloadRecord {
    wallet: Address,
    envelope: PayloadEnvelope,
}

#[derive(Debug, Clone)]
struct TxRecord {
    state: TransactionState,
    op_confirmed: bool,
}

#[derive(Debug, Default)]
struct ManagerState {
    next_payload: u64,
    next_tx: u64,
    next_request: u64,
    payloads: HashMap<String, QueuedPayloadRecord>,
    transactions: HashMap<String, TxRecord>,
    relayer_options: Option<Vec<RelayerOption>>,
    signature_requests: HashMap<String, SignatureRequest>,
    handled: Vec<(String, Address)>,
    nonces: HashMap<(u64, Address, U256), u64>,
    fail_next_relay: Option<i64>,
    deleted: Vec<String>,
    selections: Vec<(String, String)>,
}

/// Deterministic in-memory recovery manager. Stands in for the external
/// wallet SDK in offline development and in the integration tests; the
/// `debug_*` handles script nonces, relayer options and failure injection.
#[derive(Clone, Default)]
pub struct InMemoryManagerAdapter {
    state: Arc<Mutex<ManagerState>>,
}

impl InMemoryManagerAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ManagerState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("manager lock poisoned: {e}")))
    }

    pub fn debug_set_nonce(
        &self,
        chain_id: u64,
        wallet: Address,
        space: U256,
        nonce: u64,
    ) -> Result<(), PortError> {
        self.lock()?.nonces.insert((chain_id, wallet, space), nonce);
        Ok(())
    }

    pub fn debug_set_relayer_options(&self, options: Vec<RelayerOption>) -> Result<(), PortError> {
        self.lock()?.relayer_options = Some(options);
        Ok(())
    }

    pub fn debug_set_signature_request(&self, request: SignatureRequest) -> Result<(), PortError> {
        self.lock()?
            .signature_requests
            .insert(request.request_id.clone(), request);
        Ok(())
    }

    pub fn debug_fail_next_relay_with(&self, code: i64) -> Result<(), PortError> {
        self.lock()?.fail_next_relay = Some(code);
        Ok(())
    }

    pub fn debug_finalize_transaction(&self, tx_id: &str) -> Result<(), PortError> {
        let mut state = self.lock()?;
        let tx = state
            .transactions
            .get_mut(tx_id)
            .ok_or_else(|| PortError::NotFound(format!("transaction not found: {tx_id}")))?;
        tx.state = TransactionState::Final;
        tx.op_confirmed = true;
        Ok(())
    }

    pub fn debug_deleted_transactions(&self) -> Result<Vec<String>, PortError> {
        Ok(self.lock()?.deleted.clone())
    }

    pub fn debug_relayer_selections(&self) -> Result<Vec<(String, String)>, PortError> {
        Ok(self.lock()?.selections.clone())
    }

    pub fn debug_handled_signers(&self) -> Result<Vec<(String, Address)>, PortError> {
        Ok(self.lock()?.handled.clone())
    }

    pub fn debug_queued_envelope(&self, payload_id: &str) -> Result<PayloadEnvelope, PortError> {
        let state = self.lock()?;
        state
            .payloads
            .get(payload_id)
            .map(|p| p.envelope.clone())
            .ok_or_else(|| PortError::NotFound(format!("payload not found: {payload_id}")))
    }
}

impl ManagerPort for InMemoryManagerAdapter {
    fn queue_payload(
        &self,
        wallet: Address,
        chain_id: u64,
        envelope: &PayloadEnvelope,
    ) -> Result<String, PortError> {
        let mut state = self.lock()?;
        state.next_payload += 1;
        let payload_id = format!("payload-{}", state.next_payload);
        state.payloads.insert(
            payload_id.clone(),
            QueuedPayloadRecord {
                wallet,
                envelope: envelope.clone(),
            },
        );
        debug!(payload_id, %wallet, chain_id, "payload queued in memory");
        Ok(payload_id)
    }

    fn complete_payload(&self, payload_id: &str) -> Result<CompletedPayload, PortError> {
        let state = self.lock()?;
        let record = state
            .payloads
            .get(payload_id)
            .ok_or_else(|| PortError::NotFound(format!("payload not found: {payload_id}")))?;
        // Deterministic completion calldata derived from the envelope.
        let encoded = serde_json::to_vec(&record.envelope)
            .map_err(|e| PortError::Validation(format!("envelope serialization failed: {e}")))?;
        let digest = keccak256(&encoded);
        Ok(CompletedPayload {
            to: record.wallet,
            data: Bytes::copy_from_slice(digest.as_slice()),
        })
    }

    fn signature_request(&self, request_id: &str) -> Result<SignatureRequest, PortError> {
        let state = self.lock()?;
        state
            .signature_requests
            .get(request_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("signature request not found: {request_id}")))
    }

    fn handle_signer(&self, request_id: &str, signer: Address) -> Result<(), PortError> {
        self.lock()?.handled.push((request_id.to_owned(), signer));
        Ok(())
    }

    fn request_transaction(
        &self,
        wallet: Address,
        chain_id: u64,
        calls: &[Call],
        source: &str,
    ) -> Result<String, PortError> {
        let mut state = self.lock()?;
        state.next_tx += 1;
        let tx_id = format!("tx-{}", state.next_tx);
        state.transactions.insert(
            tx_id.clone(),
            TxRecord {
                state: TransactionState::Requested,
                op_confirmed: false,
            },
        );
        debug!(tx_id, %wallet, chain_id, calls = calls.len(), source, "transaction requested");
        Ok(tx_id)
    }

    fn define_transaction(&self, tx_id: &str, _nonce: u64, _space: U256) -> Result<(), PortError> {
        let mut state = self.lock()?;
        let tx = state
            .transactions
            .get_mut(tx_id)
            .ok_or_else(|| PortError::NotFound(format!("transaction not found: {tx_id}")))?;
        tx.state = TransactionState::Defined;
        Ok(())
    }

    fn transaction_state(&self, tx_id: &str) -> Result<TransactionState, PortError> {
        let state = self.lock()?;
        state
            .transactions
            .get(tx_id)
            .map(|t| t.state)
            .ok_or_else(|| PortError::NotFound(format!("transaction not found: {tx_id}")))
    }

    fn relayer_options(&self, _tx_id: &str) -> Result<Vec<RelayerOption>, PortError> {
        let state = self.lock()?;
        Ok(state.relayer_options.clone().unwrap_or_else(|| {
            vec![RelayerOption {
                option_id: "standard-free".to_owned(),
                relayer_id: None,
                kind: RelayerKind::Standard,
                fee_required: false,
            }]
        }))
    }

    fn select_relayer(&self, tx_id: &str, option_id: &str) -> Result<String, PortError> {
        let mut state = self.lock()?;
        if !state.transactions.contains_key(tx_id) {
            return Err(PortError::NotFound(format!("transaction not found: {tx_id}")));
        }
        state.next_request += 1;
        state
            .selections
            .push((tx_id.to_owned(), option_id.to_owned()));
        let request_id = format!("sig-req-{}", state.next_request);
        state.signature_requests.entry(request_id.clone()).or_insert(SignatureRequest {
            request_id: request_id.clone(),
            signers: Vec::new(),
        });
        debug!(tx_id, request_id, option_id, "relayer selected in memory");
        Ok(request_id)
    }

    fn relay(&self, tx_id: &str) -> Result<(), PortError> {
        let mut state = self.lock()?;
        if let Some(code) = state.fail_next_relay.take() {
            return Err(PortError::Rpc {
                code,
                message: "relay rejected".to_owned(),
            });
        }
        let tx = state
            .transactions
            .get_mut(tx_id)
            .ok_or_else(|| PortError::NotFound(format!("transaction not found: {tx_id}")))?;
        tx.state = TransactionState::Relayed;
        Ok(())
    }

    fn delete_transaction(&self, tx_id: &str) -> Result<(), PortError> {
        let mut state = self.lock()?;
        state.transactions.remove(tx_id);
        state.deleted.push(tx_id.to_owned());
        Ok(())
    }

    fn transaction_update(&self, tx_id: &str) -> Result<TransactionUpdate, PortError> {
        let state = self.lock()?;
        let tx = state
            .transactions
            .get(tx_id)
            .ok_or_else(|| PortError::NotFound(format!("transaction not found: {tx_id}")))?;
        let hash = match tx.state {
            TransactionState::Relayed | TransactionState::Final => {
                Some(keccak256(tx_id.as_bytes()))
            }
            _ => None,
        };
        Ok(TransactionUpdate {
            tx_id: tx_id.to_owned(),
            state: tx.state,
            hash,
            op_confirmed: tx.op_confirmed,
        })
    }

    fn get_nonce(&self, chain_id: u64, wallet: Address, space: U256) -> Result<u64, PortError> {
        let state = self.lock()?;
        Ok(state
            .nonces
            .get(&(chain_id, wallet, space))
            .copied()
            .unwrap_or(0))
    }
}
