use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, B256};
use serde_json::Value;

use wallet_recovery_core::{PortError, ProviderPort, Receipt, TransactionRequest};

use crate::RecoveryAdapterConfig;

/// Externally connected wallet over EIP-1193 shaped JSON-RPC.
///
/// Proxy mode talks to a local bridge that fronts the real wallet
/// extension; deterministic mode synthesizes hashes and receipts for
/// offline development and tests.
#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Debug, Clone)]
struct ProviderState {
    accounts: Vec<Address>,
    chain_id: u64,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            accounts: vec!["0x1000000000000000000000000000000000000001"
                .parse()
                .expect("valid built-in deterministic account")],
            chain_id: 1,
        }
    }
}

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(RecoveryAdapterConfig::from_env())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: RecoveryAdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.eip1193_proxy_url {
            let timeout = std::time::Duration::from_millis(config.provider_timeout_ms);
            match reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
            {
                Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) => {
                    if config.strict_runtime_required() {
                        ProviderMode::Disabled(format!(
                            "failed to initialize EIP-1193 proxy client in production profile: {e}"
                        ))
                    } else {
                        ProviderMode::Deterministic
                    }
                }
            }
        } else if config.strict_runtime_required() {
            ProviderMode::Disabled(
                "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            ProviderMode::Deterministic
        };

        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
        }
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<std::sync::MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    fn proxy_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = match &self.mode {
            ProviderMode::Proxy(proxy) => proxy,
            ProviderMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
            ProviderMode::Deterministic => {
                return Err(PortError::NotImplemented("eip1193 proxy runtime not enabled"))
            }
        };

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        if let Some(err) = body.get("error") {
            // Preserve the provider code so user rejections (4001) stay
            // distinguishable from transport failures.
            let code = err.get("code").and_then(|c| c.as_i64());
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("provider error")
                .to_owned();
            return Err(match code {
                Some(code) => PortError::Rpc { code, message },
                None => PortError::Transport(format!("eip1193 proxy returned error: {err}")),
            });
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()))
    }

    /// Test hook: replace the deterministic account set.
    pub fn debug_set_accounts(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.lock_state()?.accounts = accounts;
        Ok(())
    }
}

impl ProviderPort for Eip1193Adapter {
    fn unique_id(&self) -> String {
        match &self.mode {
            ProviderMode::Proxy(proxy) => format!("eip1193-proxy:{}", proxy.base_url),
            ProviderMode::Deterministic => "eip1193-deterministic".to_owned(),
            ProviderMode::Disabled(_) => "eip1193-disabled".to_owned(),
        }
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.check_mode()?;
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.proxy_call("eth_requestAccounts", serde_json::json!([]))?;
            let arr = result.as_array().ok_or_else(|| {
                PortError::Transport("eth_requestAccounts: array expected".to_owned())
            })?;
            let mut accounts = Vec::with_capacity(arr.len());
            for item in arr {
                let raw = item.as_str().ok_or_else(|| {
                    PortError::Transport("eth_requestAccounts: string expected".to_owned())
                })?;
                let parsed: Address = raw
                    .parse()
                    .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))?;
                accounts.push(parsed);
            }
            self.lock_state()?.accounts = accounts.clone();
            return Ok(accounts);
        }
        Ok(self.lock_state()?.accounts.clone())
    }

    fn chain_id(&self) -> Result<u64, PortError> {
        self.check_mode()?;
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result = self.proxy_call("eth_chainId", serde_json::json!([]))?;
            let chain_id = json_chain_id_to_u64(&result)?;
            self.lock_state()?.chain_id = chain_id;
            return Ok(chain_id);
        }
        Ok(self.lock_state()?.chain_id)
    }

    fn switch_chain(&self, chain_id: u64) -> Result<(), PortError> {
        self.check_mode()?;
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let params = serde_json::json!([{ "chainId": format!("0x{chain_id:x}") }]);
            self.proxy_call("wallet_switchEthereumChain", params)?;
        }
        self.lock_state()?.chain_id = chain_id;
        Ok(())
    }

    fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, PortError> {
        self.check_mode()?;
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let params = serde_json::json!([{
                "from": request.from,
                "to": request.to,
                "value": format!("0x{:x}", request.value),
                "data": request.data,
                "chainId": format!("0x{:x}", request.chain_id),
            }]);
            let result = self.proxy_call("eth_sendTransaction", params)?;
            let hash = result.as_str().ok_or_else(|| {
                PortError::Transport("eth_sendTransaction must return tx hash".to_owned())
            })?;
            return hash
                .parse()
                .map_err(|e| PortError::Validation(format!("invalid tx hash: {e}")));
        }

        let canonical = serde_json::to_vec(request)
            .map_err(|e| PortError::Validation(format!("tx serialization failed: {e}")))?;
        Ok(keccak256(canonical))
    }

    fn transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, PortError> {
        self.check_mode()?;
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            let result =
                self.proxy_call("eth_getTransactionReceipt", serde_json::json!([hash]))?;
            if result.is_null() {
                return Ok(None);
            }
            let receipt: Receipt = serde_json::from_value(result)
                .map_err(|e| PortError::Transport(format!("receipt decode failed: {e}")))?;
            return Ok(Some(receipt));
        }

        // Deterministic receipts confirm immediately.
        Ok(Some(Receipt {
            transaction_hash: hash,
            status: "0x1".to_owned(),
            block_number: Some("0x1".to_owned()),
        }))
    }
}

fn json_chain_id_to_u64(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Validation("chain id must be string or number".to_owned()))?;
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid chain id: {e}")))
    }
}
