// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! Read contracts the query layer consumes.
//!
//! [`Storage`] is the mandatory core every backend provides. Optional
//! capabilities are reached through accessor methods that return `None`
//! unless the backend overrides them, so capability detection is a matter of
//! which accessors a backend implements.

use std::fmt;

use async_trait::async_trait;
use num::BigUint;

pub mod error;
pub mod memory;
pub mod models;
pub mod sqlite;
pub mod watchlist;

pub use error::NotFoundExt;
pub use error::StorageError;
pub use error::StorageResult;
pub use memory::MemoryStorage;
pub use models::Address;
pub use models::AddressStats;
pub use models::BalanceChange;
pub use models::Block;
pub use models::Hash;
pub use models::NetworkStats;
pub use models::Page;
pub use models::Proposal;
pub use models::ProposalStatus;
pub use models::SetCodeAuthorization;
pub use models::TokenHolder;
pub use models::Transaction;
pub use models::Validator;
pub use models::WatchedAddress;
pub use sqlite::SqliteStorage;
pub use watchlist::MemoryWatchlist;
pub use watchlist::WatchlistStore;

use crate::block_range::BlockRange;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Highest indexed block. `NotFound` while the chain is empty.
    async fn latest_height(&self) -> StorageResult<u64>;

    async fn block_by_number(&self, number: u64) -> StorageResult<Block>;

    async fn block_by_hash(&self, hash: &Hash) -> StorageResult<Block>;

    /// Blocks inside `range`, ascending by number.
    async fn blocks_in_range(&self, range: BlockRange) -> StorageResult<Vec<Block>>;

    /// Latest block produced at or before `timestamp`.
    async fn block_at_or_before(&self, timestamp: u64) -> StorageResult<Block>;

    async fn transaction_by_hash(&self, hash: &Hash) -> StorageResult<Transaction>;

    /// Transactions of one block in execution order.
    async fn block_transactions(&self, number: u64) -> StorageResult<Vec<Transaction>>;

    /// Native balance at `at` (or at the head when `None`). Unknown
    /// addresses hold zero.
    async fn balance(&self, address: &Address, at: Option<u64>) -> StorageResult<BigUint>;

    async fn balance_history(
        &self,
        address: &Address,
        range: BlockRange,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<BalanceChange>>;

    async fn network_stats(&self) -> StorageResult<NetworkStats>;

    async fn proposals(
        &self,
        status: Option<ProposalStatus>,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<Proposal>>;

    async fn proposal(&self, id: u64) -> StorageResult<Proposal>;

    async fn validators(&self) -> StorageResult<Vec<Validator>>;

    fn address_activity(&self) -> Option<&dyn AddressActivityReader> {
        None
    }

    fn set_code_authorizations(&self) -> Option<&dyn SetCodeAuthorizationReader> {
        None
    }

    fn token_holders(&self) -> Option<&dyn TokenHolderReader> {
        None
    }
}

/// Per-address transaction index.
#[async_trait]
pub trait AddressActivityReader: Send + Sync {
    /// Transactions sent or received by `address`, newest first.
    async fn address_transactions(
        &self,
        address: &Address,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<Transaction>>;

    async fn address_stats(&self, address: &Address) -> StorageResult<AddressStats>;
}

/// Set-code (account delegation) authorization records.
#[async_trait]
pub trait SetCodeAuthorizationReader: Send + Sync {
    async fn authorizations_by_authority(
        &self,
        authority: &Address,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<SetCodeAuthorization>>;

    async fn authorizations_by_target(
        &self,
        target: &Address,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<SetCodeAuthorization>>;
}

/// Token holder balances.
#[async_trait]
pub trait TokenHolderReader: Send + Sync {
    /// Holders of `token`, largest balance first.
    async fn token_holders(
        &self,
        token: &Address,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<TokenHolder>>;

    async fn token_balance(&self, token: &Address, holder: &Address)
        -> StorageResult<TokenHolder>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    AddressActivity,
    SetCodeAuthorizations,
    TokenHolders,
}

impl Capability {
    pub const ALL: [Capability; 3] =
        [Capability::AddressActivity, Capability::SetCodeAuthorizations, Capability::TokenHolders];

    pub fn is_provided_by(&self, storage: &dyn Storage) -> bool {
        match self {
            Capability::AddressActivity => storage.address_activity().is_some(),
            Capability::SetCodeAuthorizations => storage.set_code_authorizations().is_some(),
            Capability::TokenHolders => storage.token_holders().is_some(),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::AddressActivity => "address activity indexing",
            Capability::SetCodeAuthorizations => "delegation authorization indexing",
            Capability::TokenHolders => "token holder indexing",
        };
        f.write_str(name)
    }
}
