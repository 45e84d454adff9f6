use alloy::primitives::U256;

use wallet_recovery_core::{EntropyPort, PortError};

/// OS-backed entropy source. Payload spaces are 160-bit values, matching
/// the recovery module's nonce-space width.
#[derive(Debug, Clone, Default)]
pub struct OsEntropyAdapter;

impl EntropyPort for OsEntropyAdapter {
    fn random_space(&self) -> Result<U256, PortError> {
        let mut bytes = [0u8; 20];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| PortError::Transport(format!("entropy source failed: {e}")))?;
        Ok(U256::from_be_slice(&bytes))
    }
}
