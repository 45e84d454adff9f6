use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampMs(pub u64);

/// Lifecycle of one tracked recovery-payload transaction.
///
/// `Preparing` is set when a send is initiated, `Pending` once a hash is
/// obtained. `Success`, `Cancelled`, `Failed`, `UnknownChain`, `Error` and
/// `Timeout` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Idle,
    Preparing,
    Pending,
    Success,
    Cancelled,
    Failed,
    UnknownChain,
    Error,
    Timeout,
}

impl TxStatus {
    /// Statuses that stop the receipt poller.
    pub fn stops_polling(self) -> bool {
        matches!(
            self,
            TxStatus::Success | TxStatus::Cancelled | TxStatus::Error | TxStatus::Timeout
        )
    }
}

/// One logical recovery payload's on-chain progress, as tracked by the
/// transaction hash store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTransaction {
    pub id: Option<String>,
    pub hash: Option<B256>,
    pub status: Option<TxStatus>,
    pub code: Option<String>,
    pub chain_id: Option<u64>,
}

/// Shallow-merge patch for a tracked transaction. `None` fields leave the
/// existing value untouched.
#[derive(Debug, Clone, Default)]
pub struct TrackedTransactionPatch {
    pub hash: Option<B256>,
    pub status: Option<TxStatus>,
    pub code: Option<String>,
    pub chain_id: Option<u64>,
}

impl TrackedTransaction {
    pub fn apply(&mut self, patch: &TrackedTransactionPatch) {
        if let Some(hash) = patch.hash {
            self.hash = Some(hash);
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
        if let Some(ref code) = patch.code {
            self.code = Some(code.clone());
        }
        if let Some(chain_id) = patch.chain_id {
            self.chain_id = Some(chain_id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Native,
    Erc20,
    Erc721,
    Erc1155,
    Unknown,
}

/// Best-effort decoded intent of a single call within a payload. Derived
/// purely from `to`/`value`/`data` by selector matching; never authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCall {
    pub kind: CallKind,
    pub recipient: Option<Address>,
    pub amount: Option<U256>,
    pub token_id: Option<U256>,
    pub contract_address: Option<Address>,
    pub decimals: Option<u8>,
    pub symbol: Option<String>,
    pub description: String,
}

impl ParsedCall {
    pub fn unknown(description: impl Into<String>) -> Self {
        Self {
            kind: CallKind::Unknown,
            recipient: None,
            amount: None,
            token_id: None,
            contract_address: None,
            decimals: None,
            symbol: None,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    Native,
    Erc20,
    Erc721,
    Erc1155,
}

/// Normalized coin or collectible holding, the input to call construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenRecord {
    Coin {
        contract_address: Address,
        contract_type: ContractType,
        decimals: u8,
        balance: U256,
        symbol: Option<String>,
    },
    Collectible {
        contract_address: Address,
        contract_type: ContractType,
        token_id: U256,
        balance: U256,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorOnError {
    Revert,
    Ignore,
    Abort,
}

/// A wallet call with its execution flags. Gas estimation is delegated to
/// the relayer, so the default gas limit is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: U256,
    pub delegate_call: bool,
    pub only_fallback: bool,
    pub behavior_on_error: BehaviorOnError,
}

impl Call {
    pub fn with_defaults(to: Address, value: U256, data: Bytes) -> Self {
        Self {
            to,
            value,
            data,
            gas_limit: U256::ZERO,
            delegate_call: false,
            only_fallback: false,
            behavior_on_error: BehaviorOnError::Revert,
        }
    }
}

/// Typed payload envelope submitted to the recovery module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEnvelope {
    pub kind: PayloadKind,
    pub space: U256,
    pub nonce: u64,
    pub calls: Vec<Call>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Call,
}

/// A payload already queued against the wallet's recovery module. Owned by
/// the external manager; the core only reads it. Execution is permitted
/// once now >= `end_timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRecoveryPayload {
    pub payload_id: String,
    pub chain_id: u64,
    pub wallet: Address,
    pub start_timestamp: TimestampMs,
    pub end_timestamp: TimestampMs,
    pub envelope: PayloadEnvelope,
}

impl QueuedRecoveryPayload {
    pub fn is_unlocked(&self, now: TimestampMs) -> bool {
        now.0 >= self.end_timestamp.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerState {
    Unavailable,
    Actionable,
    Ready,
}

/// Handler kinds the flows react to. The recovery extension handler backs
/// the execute-recovery relay path. Kinds this crate does not know are
/// preserved verbatim in `Other`, never rejected at the deserialization
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    RecoveryExtension,
    RecoverySigner,
    Other(String),
}

impl HandlerKind {
    pub fn as_str(&self) -> &str {
        match self {
            HandlerKind::RecoveryExtension => "recovery-extension",
            HandlerKind::RecoverySigner => "recovery-signer",
            HandlerKind::Other(raw) => raw,
        }
    }
}

impl Serialize for HandlerKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HandlerKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "recovery-extension" => HandlerKind::RecoveryExtension,
            "recovery-signer" => HandlerKind::RecoverySigner,
            _ => HandlerKind::Other(raw),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerElement {
    pub address: Address,
    pub handler_kind: HandlerKind,
    pub state: SignerState,
}

/// Snapshot of a manager signature request. Delivered at-least-once; flows
/// must tolerate re-delivery of the same signer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    pub request_id: String,
    pub signers: Vec<SignerElement>,
}

impl SignatureRequest {
    pub fn signer_in_state(&self, state: SignerState) -> Option<&SignerElement> {
        self.signers.iter().find(|s| s.state == state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Requested,
    Defined,
    Relayed,
    Final,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayerKind {
    Standard,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayerOption {
    pub option_id: String,
    pub relayer_id: Option<String>,
    pub kind: RelayerKind,
    pub fee_required: bool,
}

/// Live manager-side view of a relayed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionUpdate {
    pub tx_id: String,
    pub state: TransactionState,
    pub hash: Option<B256>,
    pub op_confirmed: bool,
}

/// Completed payload dispatch target returned by the recovery manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPayload {
    pub to: Address,
    pub data: Bytes,
}

/// Transaction request shape handed to the external provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub chain_id: u64,
}

/// Receipt as returned by `eth_getTransactionReceipt`. Only the hex status
/// field matters to the poller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: B256,
    pub status: String,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
}

/// Token balance snapshot from the token store. The zero contract address
/// denotes the chain's native coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub contract_address: Address,
    pub chain_id: u64,
    pub balance: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectibleRecord {
    pub contract_address: Address,
    pub chain_id: u64,
    pub token_id: U256,
    pub balance: U256,
    pub is_owner: bool,
}
