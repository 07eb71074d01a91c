// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::collections::BTreeMap;
use std::collections::HashSet;

use async_trait::async_trait;
use num::BigUint;

use super::models::*;
use super::AddressActivityReader;
use super::SetCodeAuthorizationReader;
use super::Storage;
use super::StorageError;
use super::StorageResult;
use super::TokenHolderReader;
use crate::block_range::BlockRange;

const GENESIS_TIME: u64 = 1_700_000_000;
const BLOCK_TIME: u64 = 2;
const BLOCK_GAS_LIMIT: u64 = 30_000_000;
const TRANSFER_GAS: u64 = 21_000;

/// Storage backend kept entirely in memory.
///
/// Every optional capability is off until enabled, which makes it possible
/// to serve the same data with and without a given index.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    blocks: BTreeMap<u64, Block>,
    transactions: Vec<Transaction>,
    balance_changes: Vec<BalanceChange>,
    proposals: BTreeMap<u64, Proposal>,
    validators: Vec<Validator>,
    address_index: bool,
    authorizations: Option<Vec<SetCodeAuthorization>>,
    token_holders: Option<Vec<TokenHolder>>,
}

impl MemoryStorage {
    /// Deterministic chain `0..=latest_height` with `txs_per_block` transfers
    /// in every block after genesis.
    pub fn with_generated_chain(latest_height: u64, txs_per_block: u32) -> Self {
        let mut storage = Self::default();
        for number in 0..=latest_height {
            let tx_count = if number == 0 { 0 } else { txs_per_block };
            let transactions = (0..tx_count)
                .map(|index| {
                    let seed = number * 1_000 + index as u64;
                    Transaction {
                        hash: Hash::from_low_u64(seed + 1),
                        block_number: number,
                        index,
                        from: Address::from_low_u64(number % 10 + 1),
                        to: Some(Address::from_low_u64((number + 1) % 10 + 1)),
                        value: BigUint::from(seed) * BigUint::from(1_000_000_000u64),
                        gas_used: TRANSFER_GAS,
                        success: index % 7 != 6,
                    }
                })
                .collect::<Vec<_>>();
            let block = Block {
                number,
                hash: Hash::from_low_u64(u64::MAX - number),
                parent_hash: Hash::from_low_u64(u64::MAX - number.saturating_sub(1)),
                timestamp: GENESIS_TIME + number * BLOCK_TIME,
                miner: Address::from_low_u64(100 + number % 4),
                gas_used: TRANSFER_GAS * tx_count as u64,
                gas_limit: BLOCK_GAS_LIMIT,
                transaction_count: tx_count,
            };
            storage.insert_block(block, transactions);
        }
        storage
    }

    pub fn insert_block(&mut self, block: Block, transactions: Vec<Transaction>) {
        self.transactions.retain(|tx| tx.block_number != block.number);
        self.transactions.extend(transactions);
        self.blocks.insert(block.number, block);
    }

    pub fn insert_balance_change(&mut self, change: BalanceChange) {
        self.balance_changes.push(change);
    }

    pub fn insert_proposal(&mut self, proposal: Proposal) {
        self.proposals.insert(proposal.id, proposal);
    }

    pub fn insert_validator(&mut self, validator: Validator) {
        self.validators.push(validator);
    }

    pub fn enable_address_index(&mut self) {
        self.address_index = true;
    }

    pub fn enable_set_code_authorizations(&mut self, records: Vec<SetCodeAuthorization>) {
        self.authorizations = Some(records);
    }

    pub fn enable_token_holders(&mut self, holders: Vec<TokenHolder>) {
        self.token_holders = Some(holders);
    }

    fn not_found(what: impl Into<String>) -> StorageError {
        StorageError::NotFound(what.into())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn latest_height(&self) -> StorageResult<u64> {
        self.blocks.keys().next_back().copied().ok_or_else(|| Self::not_found("chain head"))
    }

    async fn block_by_number(&self, number: u64) -> StorageResult<Block> {
        self.blocks.get(&number).cloned().ok_or_else(|| Self::not_found(format!("block {number}")))
    }

    async fn block_by_hash(&self, hash: &Hash) -> StorageResult<Block> {
        self.blocks
            .values()
            .find(|block| block.hash == *hash)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("block {hash}")))
    }

    async fn blocks_in_range(&self, range: BlockRange) -> StorageResult<Vec<Block>> {
        Ok(self.blocks.range(range.start_block..=range.end_block).map(|(_, b)| b.clone()).collect())
    }

    async fn block_at_or_before(&self, timestamp: u64) -> StorageResult<Block> {
        self.blocks
            .values()
            .rev()
            .find(|block| block.timestamp <= timestamp)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("block at {timestamp}")))
    }

    async fn transaction_by_hash(&self, hash: &Hash) -> StorageResult<Transaction> {
        self.transactions
            .iter()
            .find(|tx| tx.hash == *hash)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("transaction {hash}")))
    }

    async fn block_transactions(&self, number: u64) -> StorageResult<Vec<Transaction>> {
        if !self.blocks.contains_key(&number) {
            return Err(Self::not_found(format!("block {number}")));
        }
        let mut transactions = self
            .transactions
            .iter()
            .filter(|tx| tx.block_number == number)
            .cloned()
            .collect::<Vec<_>>();
        transactions.sort_by_key(|tx| tx.index);
        Ok(transactions)
    }

    async fn balance(&self, address: &Address, at: Option<u64>) -> StorageResult<BigUint> {
        let latest = self
            .balance_changes
            .iter()
            .filter(|change| change.address == *address)
            .filter(|change| at.is_none_or(|at| change.block_number <= at))
            .max_by_key(|change| change.block_number);
        Ok(latest.map(|change| change.current.clone()).unwrap_or_default())
    }

    async fn balance_history(
        &self,
        address: &Address,
        range: BlockRange,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<BalanceChange>> {
        let mut changes = self
            .balance_changes
            .iter()
            .filter(|change| change.address == *address && range.contains(change.block_number))
            .cloned()
            .collect::<Vec<_>>();
        changes.sort_by(|a, b| b.block_number.cmp(&a.block_number));
        Ok(Page::slice(changes, limit, offset))
    }

    async fn network_stats(&self) -> StorageResult<NetworkStats> {
        let mut addresses = HashSet::new();
        for tx in &self.transactions {
            addresses.insert(tx.from);
            if let Some(to) = tx.to {
                addresses.insert(to);
            }
        }
        let average_block_time_ms = match (self.blocks.values().next(), self.blocks.values().last())
        {
            (Some(first), Some(last)) if last.number > first.number => {
                let elapsed_ms = last.timestamp.saturating_sub(first.timestamp) as f64 * 1000.0;
                Some(elapsed_ms / (last.number - first.number) as f64)
            }
            _ => None,
        };
        Ok(NetworkStats {
            latest_height: self.blocks.keys().next_back().copied().unwrap_or_default(),
            total_transactions: self.transactions.len() as u64,
            total_addresses: addresses.len() as u64,
            average_block_time_ms,
        })
    }

    async fn proposals(
        &self,
        status: Option<ProposalStatus>,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<Proposal>> {
        let proposals = self
            .proposals
            .values()
            .rev()
            .filter(|proposal| status.is_none_or(|status| proposal.status == status))
            .cloned()
            .collect();
        Ok(Page::slice(proposals, limit, offset))
    }

    async fn proposal(&self, id: u64) -> StorageResult<Proposal> {
        self.proposals.get(&id).cloned().ok_or_else(|| Self::not_found(format!("proposal {id}")))
    }

    async fn validators(&self) -> StorageResult<Vec<Validator>> {
        Ok(self.validators.clone())
    }

    fn address_activity(&self) -> Option<&dyn AddressActivityReader> {
        self.address_index.then_some(self as &dyn AddressActivityReader)
    }

    fn set_code_authorizations(&self) -> Option<&dyn SetCodeAuthorizationReader> {
        self.authorizations.as_ref().map(|_| self as &dyn SetCodeAuthorizationReader)
    }

    fn token_holders(&self) -> Option<&dyn TokenHolderReader> {
        self.token_holders.as_ref().map(|_| self as &dyn TokenHolderReader)
    }
}

#[async_trait]
impl AddressActivityReader for MemoryStorage {
    async fn address_transactions(
        &self,
        address: &Address,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<Transaction>> {
        let mut transactions = self
            .transactions
            .iter()
            .filter(|tx| tx.touches(address))
            .cloned()
            .collect::<Vec<_>>();
        transactions.sort_by(|a, b| (b.block_number, b.index).cmp(&(a.block_number, a.index)));
        Ok(Page::slice(transactions, limit, offset))
    }

    async fn address_stats(&self, address: &Address) -> StorageResult<AddressStats> {
        let blocks = self
            .transactions
            .iter()
            .filter(|tx| tx.touches(address))
            .map(|tx| tx.block_number)
            .collect::<Vec<_>>();
        if blocks.is_empty() {
            return Err(Self::not_found(format!("address {address}")));
        }
        Ok(AddressStats {
            address: *address,
            transaction_count: blocks.len() as u64,
            first_seen_block: blocks.iter().min().copied(),
            last_seen_block: blocks.iter().max().copied(),
        })
    }
}

#[async_trait]
impl SetCodeAuthorizationReader for MemoryStorage {
    async fn authorizations_by_authority(
        &self,
        authority: &Address,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<SetCodeAuthorization>> {
        Ok(self.select_authorizations(|record| record.authority == *authority, limit, offset))
    }

    async fn authorizations_by_target(
        &self,
        target: &Address,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<SetCodeAuthorization>> {
        Ok(self.select_authorizations(|record| record.target == *target, limit, offset))
    }
}

impl MemoryStorage {
    fn select_authorizations(
        &self,
        predicate: impl Fn(&SetCodeAuthorization) -> bool,
        limit: usize,
        offset: usize,
    ) -> Page<SetCodeAuthorization> {
        let mut records = self
            .authorizations
            .iter()
            .flatten()
            .filter(|record| predicate(record))
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by(|a, b| b.block_number.cmp(&a.block_number));
        Page::slice(records, limit, offset)
    }
}

#[async_trait]
impl TokenHolderReader for MemoryStorage {
    async fn token_holders(
        &self,
        token: &Address,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<TokenHolder>> {
        let mut holders = self
            .token_holders
            .iter()
            .flatten()
            .filter(|holder| holder.token == *token)
            .cloned()
            .collect::<Vec<_>>();
        holders.sort_by(|a, b| b.balance.cmp(&a.balance).then(a.holder.cmp(&b.holder)));
        Ok(Page::slice(holders, limit, offset))
    }

    async fn token_balance(
        &self,
        token: &Address,
        holder: &Address,
    ) -> StorageResult<TokenHolder> {
        self.token_holders
            .iter()
            .flatten()
            .find(|record| record.token == *token && record.holder == *holder)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("holder {holder} of {token}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generated_chain_shape() {
        let storage = MemoryStorage::with_generated_chain(10, 3);
        assert_eq!(storage.latest_height().await.unwrap(), 10);

        let genesis = storage.block_by_number(0).await.unwrap();
        assert_eq!(genesis.transaction_count, 0);

        let block = storage.block_by_number(4).await.unwrap();
        assert_eq!(block.parent_hash, storage.block_by_number(3).await.unwrap().hash);
        assert_eq!(storage.block_transactions(4).await.unwrap().len(), 3);

        let by_hash = storage.block_by_hash(&block.hash).await.unwrap();
        assert_eq!(by_hash.number, 4);
    }

    #[tokio::test]
    async fn test_empty_chain_has_no_head() {
        let storage = MemoryStorage::default();
        assert!(matches!(storage.latest_height().await, Err(StorageError::NotFound(_))));
        assert!(matches!(storage.block_transactions(1).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_capabilities_are_opt_in() {
        let mut storage = MemoryStorage::with_generated_chain(3, 1);
        assert!(storage.address_activity().is_none());
        assert!(storage.set_code_authorizations().is_none());
        assert!(Storage::token_holders(&storage).is_none());

        storage.enable_address_index();
        storage.enable_token_holders(vec![]);
        assert!(storage.address_activity().is_some());
        assert!(storage.set_code_authorizations().is_none());
        assert!(Storage::token_holders(&storage).is_some());
    }

    #[tokio::test]
    async fn test_balance_at_height() {
        let mut storage = MemoryStorage::default();
        let address = Address::from_low_u64(1);
        for (block_number, current) in [(2u64, 10u64), (5, 7), (9, 30)] {
            storage.insert_balance_change(BalanceChange {
                address,
                block_number,
                transaction_hash: None,
                previous: BigUint::default(),
                current: BigUint::from(current),
            });
        }
        assert_eq!(storage.balance(&address, None).await.unwrap(), BigUint::from(30u64));
        assert_eq!(storage.balance(&address, Some(6)).await.unwrap(), BigUint::from(7u64));
        assert_eq!(storage.balance(&address, Some(1)).await.unwrap(), BigUint::default());

        let history =
            storage.balance_history(&address, BlockRange { start_block: 3, end_block: 9 }, 10, 0);
        let history = history.await.unwrap();
        assert_eq!(history.total_count, Some(2));
        assert_eq!(history.items[0].block_number, 9);
    }

    #[tokio::test]
    async fn test_network_stats() {
        let storage = MemoryStorage::with_generated_chain(10, 2);
        let stats = storage.network_stats().await.unwrap();
        assert_eq!(stats.latest_height, 10);
        assert_eq!(stats.total_transactions, 20);
        assert_eq!(stats.average_block_time_ms, Some(2000.0));
    }
}
