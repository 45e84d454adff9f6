use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, U256};

use wallet_recovery_core::{
    CollectibleRecord, CollectibleStorePort, Observable, PortError, Subscription, TokenBalance,
    TokenStorePort,
};

/// Observable token balance list. `fetch_token_balance_if_missing` promotes
/// a seeded balance into the visible list, standing in for the remote
/// indexer lookup the production store performs.
#[derive(Clone)]
pub struct InMemoryTokenStore {
    balances: Observable<Vec<TokenBalance>>,
    seeds: Arc<Mutex<HashMap<(u64, Address), U256>>>,
    fetch_calls: Arc<Mutex<u64>>,
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self {
            balances: Observable::new(Vec::new()),
            seeds: Arc::new(Mutex::new(HashMap::new())),
            fetch_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn insert_balance(&self, balance: TokenBalance) {
        let mut list = self.balances.get();
        list.push(balance);
        self.balances.set(list);
    }

    /// Balance that only becomes visible after a backfill fetch.
    pub fn seed_fetchable(&self, chain_id: u64, contract: Address, balance: U256) {
        self.seeds
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert((chain_id, contract), balance);
    }

    pub fn fetch_calls(&self) -> u64 {
        *self.fetch_calls.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn subscribe(
        &self,
        listener: impl FnMut(&Vec<TokenBalance>) + Send + 'static,
    ) -> Subscription {
        self.balances.subscribe(listener)
    }
}

impl TokenStorePort for InMemoryTokenStore {
    fn balances(&self) -> Vec<TokenBalance> {
        self.balances.get()
    }

    fn fetch_token_balance_if_missing(
        &self,
        chain_id: u64,
        contract_address: Address,
    ) -> Result<(), PortError> {
        *self.fetch_calls.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        let already_known = self
            .balances
            .get()
            .iter()
            .any(|b| b.chain_id == chain_id && b.contract_address == contract_address);
        if already_known {
            return Ok(());
        }
        let seeded = self
            .seeds
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&(chain_id, contract_address))
            .copied();
        if let Some(balance) = seeded {
            self.insert_balance(TokenBalance {
                contract_address,
                chain_id,
                balance,
            });
        }
        Ok(())
    }
}

/// Observable collectible list, same seeding scheme as the token store.
#[derive(Clone)]
pub struct InMemoryCollectibleStore {
    collectibles: Observable<Vec<CollectibleRecord>>,
    seeds: Arc<Mutex<HashMap<(u64, Address, U256), CollectibleRecord>>>,
    fetch_calls: Arc<Mutex<u64>>,
}

impl Default for InMemoryCollectibleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCollectibleStore {
    pub fn new() -> Self {
        Self {
            collectibles: Observable::new(Vec::new()),
            seeds: Arc::new(Mutex::new(HashMap::new())),
            fetch_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn insert_collectible(&self, record: CollectibleRecord) {
        let mut list = self.collectibles.get();
        list.push(record);
        self.collectibles.set(list);
    }

    pub fn seed_fetchable(&self, record: CollectibleRecord) {
        self.seeds
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(
                (record.chain_id, record.contract_address, record.token_id),
                record,
            );
    }

    pub fn fetch_calls(&self) -> u64 {
        *self.fetch_calls.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl CollectibleStorePort for InMemoryCollectibleStore {
    fn collectibles(&self) -> Vec<CollectibleRecord> {
        self.collectibles.get()
    }

    fn fetch_collectible_if_missing(
        &self,
        chain_id: u64,
        contract_address: Address,
        token_id: U256,
    ) -> Result<(), PortError> {
        *self.fetch_calls.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        let already_known = self.collectibles.get().iter().any(|c| {
            c.chain_id == chain_id
                && c.contract_address == contract_address
                && c.token_id == token_id
        });
        if already_known {
            return Ok(());
        }
        let seeded = self
            .seeds
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&(chain_id, contract_address, token_id))
            .cloned();
        if let Some(record) = seeded {
            self.insert_collectible(record);
        }
        Ok(())
    }
}
