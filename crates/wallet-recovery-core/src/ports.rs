use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::domain::{
    Call, CollectibleRecord, CompletedPayload, PayloadEnvelope, Receipt, RelayerOption,
    SignatureRequest, TokenBalance, TransactionRequest, TransactionState, TransactionUpdate,
};

/// EIP-1193 user-rejection code.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl PortError {
    /// True for the EIP-1193 user-rejection error (code 4001), treated as a
    /// benign cancellation rather than a hard failure.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, PortError::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }
}

/// Externally connected wallet, EIP-1193 shaped.
pub trait ProviderPort {
    /// Stable identifier of the connected provider, used to prefer a
    /// matching relayer option.
    fn unique_id(&self) -> String;
    fn request_accounts(&self) -> Result<Vec<Address>, PortError>;
    fn chain_id(&self) -> Result<u64, PortError>;
    fn switch_chain(&self, chain_id: u64) -> Result<(), PortError>;
    fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, PortError>;
    fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, PortError>;
}

/// Transaction source tag passed when requesting a recovery transaction.
pub const SOURCE_RECOVERY_PAYLOAD: &str = "recovery_payload";

/// The external recovery/transaction manager. One opaque collaborator, one
/// trait: queuing and completion of recovery payloads, transaction
/// request/define/relay orchestration, signature requests, and wallet nonce
/// reads all live behind it.
///
/// Assumed reliable and idempotent where re-invoked; signature-request
/// updates are delivered at-least-once for actionable/ready signer states.
pub trait ManagerPort {
    fn queue_payload(
        &self,
        wallet: Address,
        chain_id: u64,
        envelope: &PayloadEnvelope,
    ) -> Result<String, PortError>;
    fn complete_payload(&self, payload_id: &str) -> Result<CompletedPayload, PortError>;

    fn signature_request(&self, request_id: &str) -> Result<SignatureRequest, PortError>;
    fn handle_signer(&self, request_id: &str, signer: Address) -> Result<(), PortError>;

    fn request_transaction(
        &self,
        wallet: Address,
        chain_id: u64,
        calls: &[Call],
        source: &str,
    ) -> Result<String, PortError>;
    fn define_transaction(&self, tx_id: &str, nonce: u64, space: U256) -> Result<(), PortError>;
    fn transaction_state(&self, tx_id: &str) -> Result<TransactionState, PortError>;
    fn relayer_options(&self, tx_id: &str) -> Result<Vec<RelayerOption>, PortError>;
    /// Returns the signature request id created for the selected relayer.
    fn select_relayer(&self, tx_id: &str, option_id: &str) -> Result<String, PortError>;
    fn relay(&self, tx_id: &str) -> Result<(), PortError>;
    fn delete_transaction(&self, tx_id: &str) -> Result<(), PortError>;
    fn transaction_update(&self, tx_id: &str) -> Result<TransactionUpdate, PortError>;

    fn get_nonce(&self, chain_id: u64, wallet: Address, space: U256) -> Result<u64, PortError>;
}

/// Observable token balance list with lazy backfill.
pub trait TokenStorePort {
    fn balances(&self) -> Vec<TokenBalance>;
    fn fetch_token_balance_if_missing(
        &self,
        chain_id: u64,
        contract_address: Address,
    ) -> Result<(), PortError>;
}

/// Observable collectible list with lazy backfill.
pub trait CollectibleStorePort {
    fn collectibles(&self) -> Vec<CollectibleRecord>;
    fn fetch_collectible_if_missing(
        &self,
        chain_id: u64,
        contract_address: Address,
        token_id: U256,
    ) -> Result<(), PortError>;
}

pub trait ClockPort {
    fn now_ms(&self) -> Result<u64, PortError>;
}

pub trait EntropyPort {
    /// Random 160-bit nonce space for a payload envelope.
    fn random_space(&self) -> Result<U256, PortError>;
}
