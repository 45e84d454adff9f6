use wallet_recovery_core::{ReceiptPoller, TransactionStatusView, TxHashStore};

/// Runtime profile. The production profile refuses the deterministic
/// provider fallback instead of silently signing nothing real.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Dev,
    Production,
}

#[derive(Debug, Clone)]
pub struct RecoveryAdapterConfig {
    pub eip1193_proxy_url: Option<String>,
    pub provider_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_max_attempts: u32,
    pub status_poll_interval_ms: u64,
    pub runtime_profile: RuntimeProfile,
}

impl Default for RecoveryAdapterConfig {
    fn default() -> Self {
        Self {
            eip1193_proxy_url: None,
            provider_timeout_ms: 15_000,
            receipt_poll_interval_ms: 2_000,
            receipt_max_attempts: 20,
            status_poll_interval_ms: 500,
            runtime_profile: RuntimeProfile::Dev,
        }
    }
}

impl RecoveryAdapterConfig {
    /// Environment overrides, prefix `WALLET_RECOVERY_`. Unparseable values
    /// fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("WALLET_RECOVERY_EIP1193_PROXY_URL") {
            if !url.is_empty() {
                config.eip1193_proxy_url = Some(url);
            }
        }
        if let Some(v) = env_u64("WALLET_RECOVERY_PROVIDER_TIMEOUT_MS") {
            config.provider_timeout_ms = v;
        }
        if let Some(v) = env_u64("WALLET_RECOVERY_RECEIPT_POLL_INTERVAL_MS") {
            config.receipt_poll_interval_ms = v;
        }
        if let Some(v) = env_u64("WALLET_RECOVERY_RECEIPT_MAX_ATTEMPTS") {
            config.receipt_max_attempts = v as u32;
        }
        if let Some(v) = env_u64("WALLET_RECOVERY_STATUS_POLL_INTERVAL_MS") {
            config.status_poll_interval_ms = v;
        }
        if let Ok(profile) = std::env::var("WALLET_RECOVERY_RUNTIME_PROFILE") {
            if profile.eq_ignore_ascii_case("production") {
                config.runtime_profile = RuntimeProfile::Production;
            }
        }
        config
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    /// Receipt poller honoring the configured retry limits.
    pub fn receipt_poller(&self, payload_id: impl Into<String>) -> ReceiptPoller {
        ReceiptPoller::with_limits(
            payload_id,
            self.receipt_max_attempts,
            self.receipt_poll_interval_ms,
        )
    }

    /// Status view honoring the configured poll interval.
    pub fn status_view(
        &self,
        store: TxHashStore,
        payload_id: impl Into<String>,
        waiting_for_signature: bool,
        on_status_change: impl FnMut(bool) + Send + 'static,
    ) -> TransactionStatusView {
        TransactionStatusView::new(store, payload_id, waiting_for_signature, on_status_change)
            .with_interval(self.status_poll_interval_ms)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
