pub mod balance;
pub mod calls;
pub mod domain;
pub mod execute_flow;
pub mod execution_view;
pub mod hash_store;
pub mod observable;
pub mod ports;
pub mod queue_flow;
pub mod receipt;
pub mod status;

pub use balance::BalanceChecker;
pub use calls::{build_transfer_call, parse_call};
pub use domain::{
    BehaviorOnError, Call, CallKind, CollectibleRecord, CompletedPayload, ContractType,
    HandlerKind, ParsedCall, PayloadEnvelope, PayloadKind, QueuedRecoveryPayload, Receipt,
    RelayerKind, RelayerOption, SignatureRequest, SignerElement, SignerState, TimestampMs,
    TokenBalance, TokenRecord, TrackedTransaction, TrackedTransactionPatch, TransactionRequest,
    TransactionState, TransactionUpdate, TxStatus,
};
pub use execute_flow::{ExecuteOutcome, ExecuteRecoveryFlow};
pub use execution_view::PayloadExecutionView;
pub use hash_store::TxHashStore;
pub use observable::{Observable, Subscription};
pub use ports::{
    ClockPort, CollectibleStorePort, EntropyPort, ManagerPort, PortError, ProviderPort,
    TokenStorePort, SOURCE_RECOVERY_PAYLOAD, USER_REJECTED_CODE,
};
pub use queue_flow::QueuePayloadFlow;
pub use receipt::{PollOutcome, ReceiptPoller, RECEIPT_MAX_ATTEMPTS, RECEIPT_POLL_INTERVAL_MS};
pub use status::{TransactionStatusView, STATUS_POLL_INTERVAL_MS};
