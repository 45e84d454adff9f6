#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, B256, U256};

use wallet_recovery_core::{
    ClockPort, EntropyPort, PortError, ProviderPort, Receipt, TransactionRequest,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default)]
pub struct TestClock {
    now: AtomicU64,
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.fetch_add(1, Ordering::SeqCst) + 1_755_907_200_000)
    }
}

/// Fixed-space entropy so queued envelopes are assertable.
#[derive(Debug, Clone)]
pub struct FixedEntropy(pub U256);

impl EntropyPort for FixedEntropy {
    fn random_space(&self) -> Result<U256, PortError> {
        Ok(self.0)
    }
}

/// One scripted receipt-poll step.
#[derive(Debug, Clone)]
pub enum ReceiptStep {
    Missing,
    Found(Receipt),
    Fail(String),
}

/// Scriptable EIP-1193 stand-in. Shared handles survive moving a clone
/// into a flow, so tests can assert on what was sent afterwards.
#[derive(Clone)]
pub struct TestProvider {
    unique: String,
    receipts: Arc<Mutex<VecDeque<ReceiptStep>>>,
    receipt_calls: Arc<AtomicU32>,
    fail_send_code: Arc<Mutex<Option<i64>>>,
    sent: Arc<Mutex<Vec<TransactionRequest>>>,
}

impl TestProvider {
    pub fn new(unique: impl Into<String>) -> Self {
        Self {
            unique: unique.into(),
            receipts: Arc::new(Mutex::new(VecDeque::new())),
            receipt_calls: Arc::new(AtomicU32::new(0)),
            fail_send_code: Arc::new(Mutex::new(None)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn script_receipt(&self, step: ReceiptStep) {
        self.receipts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push_back(step);
    }

    pub fn receipt_calls(&self) -> u32 {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_send_with(&self, code: i64) {
        *self.fail_send_code.lock().unwrap_or_else(|p| p.into_inner()) = Some(code);
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl ProviderPort for TestProvider {
    fn unique_id(&self) -> String {
        self.unique.clone()
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        Ok(vec![external_wallet()])
    }

    fn chain_id(&self) -> Result<u64, PortError> {
        Ok(137)
    }

    fn switch_chain(&self, _chain_id: u64) -> Result<(), PortError> {
        Ok(())
    }

    fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, PortError> {
        let fail = self
            .fail_send_code
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(code) = fail {
            return Err(PortError::Rpc {
                code,
                message: "send rejected".to_owned(),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request.clone());
        Ok(keccak256(&request.data))
    }

    fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, PortError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .receipts
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front();
        match step {
            None | Some(ReceiptStep::Missing) => Ok(None),
            Some(ReceiptStep::Found(mut receipt)) => {
                receipt.transaction_hash = hash;
                Ok(Some(receipt))
            }
            Some(ReceiptStep::Fail(message)) => Err(PortError::Transport(message)),
        }
    }
}

pub fn receipt(status: &str) -> Receipt {
    Receipt {
        transaction_hash: B256::ZERO,
        status: status.to_owned(),
        block_number: Some("0x10".to_owned()),
    }
}

pub fn external_wallet() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid external wallet address")
}

pub fn recovery_wallet() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid wallet address")
}

pub fn wallet_signer() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid signer address")
}

pub fn recipient() -> Address {
    "0x3000000000000000000000000000000000000003"
        .parse()
        .expect("valid recipient address")
}
