use alloy::primitives::{Address, U256};
use tracing::warn;

use crate::domain::{CallKind, ParsedCall};
use crate::ports::{CollectibleStorePort, TokenStorePort};

/// Determines whether the active account can afford a parsed call, lazily
/// backfilling missing balance/collectible data from the stores.
///
/// `has_enough_balance` is a pure function of the current store snapshots.
/// It never blocks on a backfill fetch, so the first evaluation may report
/// insufficient while a fetch is still in flight.
pub struct BalanceChecker<T, C>
where
    T: TokenStorePort,
    C: CollectibleStorePort,
{
    tokens: T,
    collectibles: C,
    fetch_in_flight: bool,
}

impl<T, C> BalanceChecker<T, C>
where
    T: TokenStorePort,
    C: CollectibleStorePort,
{
    pub fn new(tokens: T, collectibles: C) -> Self {
        Self {
            tokens,
            collectibles,
            fetch_in_flight: false,
        }
    }

    pub fn has_enough_balance(
        &mut self,
        call: &ParsedCall,
        transaction_amount: U256,
        chain_id: u64,
    ) -> bool {
        match call.kind {
            CallKind::Erc721 => self.check_erc721(call, chain_id),
            CallKind::Erc1155 => self.check_erc1155(call, transaction_amount, chain_id),
            CallKind::Erc20 | CallKind::Native => {
                self.check_fungible(call, transaction_amount, chain_id)
            }
            CallKind::Unknown => false,
        }
    }

    fn check_erc721(&mut self, call: &ParsedCall, chain_id: u64) -> bool {
        let (Some(contract), Some(token_id)) = (call.contract_address, call.token_id) else {
            return false;
        };
        let record = self
            .collectibles
            .collectibles()
            .into_iter()
            .find(|c| {
                c.contract_address == contract && c.token_id == token_id && c.chain_id == chain_id
            });
        match record {
            Some(record) => {
                self.fetch_in_flight = false;
                record.is_owner
            }
            None => {
                self.backfill_collectible(chain_id, contract, token_id);
                false
            }
        }
    }

    fn check_erc1155(&mut self, call: &ParsedCall, amount: U256, chain_id: u64) -> bool {
        let (Some(contract), Some(token_id)) = (call.contract_address, call.token_id) else {
            return false;
        };
        let record = self
            .collectibles
            .collectibles()
            .into_iter()
            .find(|c| {
                c.contract_address == contract && c.token_id == token_id && c.chain_id == chain_id
            });
        let balance = match record {
            Some(ref record) => {
                self.fetch_in_flight = false;
                record.balance
            }
            None => {
                self.backfill_collectible(chain_id, contract, token_id);
                U256::ZERO
            }
        };
        balance >= amount
    }

    fn check_fungible(&mut self, call: &ParsedCall, amount: U256, chain_id: u64) -> bool {
        // The zero address stands in for the chain's native coin.
        let contract = call.contract_address.unwrap_or(Address::ZERO);
        let record = self
            .tokens
            .balances()
            .into_iter()
            .find(|b| b.contract_address == contract && b.chain_id == chain_id);
        match record {
            Some(record) => {
                self.fetch_in_flight = false;
                record.balance >= amount
            }
            None => {
                self.backfill_token(chain_id, contract);
                false
            }
        }
    }

    // Fire-and-forget backfills, deduped through the in-flight flag. Errors
    // are logged and absorbed, never surfaced to the caller.
    fn backfill_token(&mut self, chain_id: u64, contract: Address) {
        if self.fetch_in_flight {
            return;
        }
        self.fetch_in_flight = true;
        if let Err(e) = self.tokens.fetch_token_balance_if_missing(chain_id, contract) {
            warn!(%contract, chain_id, error = %e, "token balance backfill failed");
        }
    }

    fn backfill_collectible(&mut self, chain_id: u64, contract: Address, token_id: U256) {
        if self.fetch_in_flight {
            return;
        }
        self.fetch_in_flight = true;
        if let Err(e) = self
            .collectibles
            .fetch_collectible_if_missing(chain_id, contract, token_id)
        {
            warn!(%contract, chain_id, %token_id, error = %e, "collectible backfill failed");
        }
    }
}
