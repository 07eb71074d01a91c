// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use async_graphql::dynamic::Enum;
use async_graphql::dynamic::EnumItem;
use async_graphql::dynamic::TypeRef;
use serde::Serialize;

use super::wire::decimal;
use super::wire::wire_enum_field;
use super::wire::wire_field;
use super::wire::WireField;
use super::wire::WireObject;
use crate::block_range::BlockRange;
use crate::helpers::rfc3339;
use crate::storage::models::*;

pub const PROPOSAL_STATUS: &str = "ProposalStatus";

pub fn proposal_status_enum() -> Enum {
    ProposalStatus::ALL
        .into_iter()
        .fold(Enum::new(PROPOSAL_STATUS), |e, status| e.item(EnumItem::new(status.as_str())))
}

fn string_nn() -> TypeRef {
    TypeRef::named_nn(TypeRef::STRING)
}

fn string() -> TypeRef {
    TypeRef::named(TypeRef::STRING)
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    #[serde(serialize_with = "decimal::serialize")]
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    #[serde(serialize_with = "decimal::serialize")]
    pub timestamp: u64,
    pub time: Option<String>,
    pub miner: Address,
    #[serde(serialize_with = "decimal::serialize")]
    pub gas_used: u64,
    #[serde(serialize_with = "decimal::serialize")]
    pub gas_limit: u64,
    pub transaction_count: u32,
}

impl From<Block> for BlockNode {
    fn from(block: Block) -> Self {
        Self {
            number: block.number,
            hash: block.hash,
            parent_hash: block.parent_hash,
            timestamp: block.timestamp,
            time: rfc3339(block.timestamp),
            miner: block.miner,
            gas_used: block.gas_used,
            gas_limit: block.gas_limit,
            transaction_count: block.transaction_count,
        }
    }
}

impl WireObject for BlockNode {
    const TYPE_NAME: &'static str = "Block";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("number", string_nn()),
            wire_field("hash", string_nn()),
            wire_field("parentHash", string_nn()),
            wire_field("timestamp", string_nn()),
            wire_field("time", string()),
            wire_field("miner", string_nn()),
            wire_field("gasUsed", string_nn()),
            wire_field("gasLimit", string_nn()),
            wire_field("transactionCount", TypeRef::named_nn(TypeRef::INT)),
        ]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionNode {
    pub hash: Hash,
    #[serde(serialize_with = "decimal::serialize")]
    pub block_number: u64,
    pub index: u32,
    pub from: Address,
    pub to: Option<Address>,
    #[serde(serialize_with = "decimal::serialize")]
    pub value: num::BigUint,
    #[serde(serialize_with = "decimal::serialize")]
    pub gas_used: u64,
    pub success: bool,
}

impl From<Transaction> for TransactionNode {
    fn from(tx: Transaction) -> Self {
        Self {
            hash: tx.hash,
            block_number: tx.block_number,
            index: tx.index,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            gas_used: tx.gas_used,
            success: tx.success,
        }
    }
}

impl WireObject for TransactionNode {
    const TYPE_NAME: &'static str = "Transaction";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("hash", string_nn()),
            wire_field("blockNumber", string_nn()),
            wire_field("index", TypeRef::named_nn(TypeRef::INT)),
            wire_field("from", string_nn()),
            wire_field("to", string()),
            wire_field("value", string_nn()),
            wire_field("gasUsed", string_nn()),
            wire_field("success", TypeRef::named_nn(TypeRef::BOOLEAN)),
        ]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChangeNode {
    pub address: Address,
    #[serde(serialize_with = "decimal::serialize")]
    pub block_number: u64,
    pub transaction_hash: Option<Hash>,
    #[serde(serialize_with = "decimal::serialize")]
    pub previous: num::BigUint,
    #[serde(serialize_with = "decimal::serialize")]
    pub current: num::BigUint,
    /// Signed difference `current - previous`.
    #[serde(serialize_with = "decimal::serialize")]
    pub delta: num::BigInt,
}

impl From<BalanceChange> for BalanceChangeNode {
    fn from(change: BalanceChange) -> Self {
        let delta = num::BigInt::from(change.current.clone())
            - num::BigInt::from(change.previous.clone());
        Self {
            address: change.address,
            block_number: change.block_number,
            transaction_hash: change.transaction_hash,
            previous: change.previous,
            current: change.current,
            delta,
        }
    }
}

impl WireObject for BalanceChangeNode {
    const TYPE_NAME: &'static str = "BalanceChange";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("address", string_nn()),
            wire_field("blockNumber", string_nn()),
            wire_field("transactionHash", string()),
            wire_field("previous", string_nn()),
            wire_field("current", string_nn()),
            wire_field("delta", string_nn()),
        ]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatsNode {
    #[serde(serialize_with = "decimal::serialize")]
    pub latest_height: u64,
    #[serde(serialize_with = "decimal::serialize")]
    pub total_transactions: u64,
    #[serde(serialize_with = "decimal::serialize")]
    pub total_addresses: u64,
    pub average_block_time_ms: Option<f64>,
}

impl From<NetworkStats> for NetworkStatsNode {
    fn from(stats: NetworkStats) -> Self {
        Self {
            latest_height: stats.latest_height,
            total_transactions: stats.total_transactions,
            total_addresses: stats.total_addresses,
            average_block_time_ms: stats.average_block_time_ms,
        }
    }
}

impl WireObject for NetworkStatsNode {
    const TYPE_NAME: &'static str = "NetworkStats";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("latestHeight", string_nn()),
            wire_field("totalTransactions", string_nn()),
            wire_field("totalAddresses", string_nn()),
            wire_field("averageBlockTimeMs", TypeRef::named(TypeRef::FLOAT)),
        ]
    }
}

/// Aggregates over the most recent blocks of the chain.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWindowNode {
    #[serde(serialize_with = "decimal::option::serialize")]
    pub from_block: Option<u64>,
    #[serde(serialize_with = "decimal::option::serialize")]
    pub to_block: Option<u64>,
    pub block_count: u32,
    #[serde(serialize_with = "decimal::serialize")]
    pub transaction_count: u64,
    #[serde(serialize_with = "decimal::serialize")]
    pub total_gas_used: u64,
    pub average_gas_used: Option<f64>,
    pub average_block_time_ms: Option<f64>,
}

impl ActivityWindowNode {
    /// `blocks` are the blocks found inside `window`, in any order.
    pub fn aggregate(window: Option<BlockRange>, blocks: &[Block]) -> Self {
        let Some(window) = window else {
            return Self::default();
        };
        let transaction_count = blocks.iter().map(|b| b.transaction_count as u64).sum();
        let total_gas_used = blocks.iter().fold(0u64, |acc, b| acc.saturating_add(b.gas_used));
        let average_gas_used =
            (!blocks.is_empty()).then(|| total_gas_used as f64 / blocks.len() as f64);
        let first = blocks.iter().min_by_key(|b| b.number);
        let last = blocks.iter().max_by_key(|b| b.number);
        let average_block_time_ms = match (first, last) {
            (Some(first), Some(last)) if last.number > first.number => {
                let elapsed_ms = last.timestamp.saturating_sub(first.timestamp) as f64 * 1000.0;
                Some(elapsed_ms / (last.number - first.number) as f64)
            }
            _ => None,
        };
        Self {
            from_block: Some(window.start_block),
            to_block: Some(window.end_block),
            block_count: blocks.len() as u32,
            transaction_count,
            total_gas_used,
            average_gas_used,
            average_block_time_ms,
        }
    }
}

impl WireObject for ActivityWindowNode {
    const TYPE_NAME: &'static str = "ActivityWindow";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("fromBlock", string()),
            wire_field("toBlock", string()),
            wire_field("blockCount", TypeRef::named_nn(TypeRef::INT)),
            wire_field("transactionCount", string_nn()),
            wire_field("totalGasUsed", string_nn()),
            wire_field("averageGasUsed", TypeRef::named(TypeRef::FLOAT)),
            wire_field("averageBlockTimeMs", TypeRef::named(TypeRef::FLOAT)),
        ]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalNode {
    #[serde(serialize_with = "decimal::serialize")]
    pub id: u64,
    pub proposer: Address,
    pub status: ProposalStatus,
    pub description: String,
    #[serde(serialize_with = "decimal::serialize")]
    pub created_at_block: u64,
    #[serde(serialize_with = "decimal::serialize")]
    pub voting_ends_at_block: u64,
    #[serde(serialize_with = "decimal::serialize")]
    pub votes_for: num::BigUint,
    #[serde(serialize_with = "decimal::serialize")]
    pub votes_against: num::BigUint,
}

impl From<Proposal> for ProposalNode {
    fn from(proposal: Proposal) -> Self {
        Self {
            id: proposal.id,
            proposer: proposal.proposer,
            status: proposal.status,
            description: proposal.description,
            created_at_block: proposal.created_at_block,
            voting_ends_at_block: proposal.voting_ends_at_block,
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
        }
    }
}

impl WireObject for ProposalNode {
    const TYPE_NAME: &'static str = "Proposal";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("id", string_nn()),
            wire_field("proposer", string_nn()),
            wire_enum_field("status", TypeRef::named_nn(PROPOSAL_STATUS)),
            wire_field("description", string_nn()),
            wire_field("createdAtBlock", string_nn()),
            wire_field("votingEndsAtBlock", string_nn()),
            wire_field("votesFor", string_nn()),
            wire_field("votesAgainst", string_nn()),
        ]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorNode {
    pub address: Address,
    pub operator: Address,
    #[serde(serialize_with = "decimal::serialize")]
    pub stake: num::BigUint,
    pub commission_bps: u32,
    pub active: bool,
}

impl From<Validator> for ValidatorNode {
    fn from(validator: Validator) -> Self {
        Self {
            address: validator.address,
            operator: validator.operator,
            stake: validator.stake,
            commission_bps: validator.commission_bps,
            active: validator.active,
        }
    }
}

impl WireObject for ValidatorNode {
    const TYPE_NAME: &'static str = "Validator";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("address", string_nn()),
            wire_field("operator", string_nn()),
            wire_field("stake", string_nn()),
            wire_field("commissionBps", TypeRef::named_nn(TypeRef::INT)),
            wire_field("active", TypeRef::named_nn(TypeRef::BOOLEAN)),
        ]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressStatsNode {
    pub address: Address,
    #[serde(serialize_with = "decimal::serialize")]
    pub transaction_count: u64,
    #[serde(serialize_with = "decimal::option::serialize")]
    pub first_seen_block: Option<u64>,
    #[serde(serialize_with = "decimal::option::serialize")]
    pub last_seen_block: Option<u64>,
}

impl From<AddressStats> for AddressStatsNode {
    fn from(stats: AddressStats) -> Self {
        Self {
            address: stats.address,
            transaction_count: stats.transaction_count,
            first_seen_block: stats.first_seen_block,
            last_seen_block: stats.last_seen_block,
        }
    }
}

impl WireObject for AddressStatsNode {
    const TYPE_NAME: &'static str = "AddressStats";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("address", string_nn()),
            wire_field("transactionCount", string_nn()),
            wire_field("firstSeenBlock", string()),
            wire_field("lastSeenBlock", string()),
        ]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCodeAuthorizationNode {
    pub transaction_hash: Hash,
    #[serde(serialize_with = "decimal::serialize")]
    pub block_number: u64,
    #[serde(serialize_with = "decimal::serialize")]
    pub chain_id: u64,
    pub authority: Address,
    pub target: Address,
    #[serde(serialize_with = "decimal::serialize")]
    pub nonce: u64,
    pub valid: bool,
}

impl From<SetCodeAuthorization> for SetCodeAuthorizationNode {
    fn from(record: SetCodeAuthorization) -> Self {
        Self {
            transaction_hash: record.transaction_hash,
            block_number: record.block_number,
            chain_id: record.chain_id,
            authority: record.authority,
            target: record.target,
            nonce: record.nonce,
            valid: record.valid,
        }
    }
}

impl WireObject for SetCodeAuthorizationNode {
    const TYPE_NAME: &'static str = "SetCodeAuthorization";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("transactionHash", string_nn()),
            wire_field("blockNumber", string_nn()),
            wire_field("chainId", string_nn()),
            wire_field("authority", string_nn()),
            wire_field("target", string_nn()),
            wire_field("nonce", string_nn()),
            wire_field("valid", TypeRef::named_nn(TypeRef::BOOLEAN)),
        ]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHolderNode {
    pub token: Address,
    pub holder: Address,
    #[serde(serialize_with = "decimal::serialize")]
    pub balance: num::BigUint,
    #[serde(serialize_with = "decimal::serialize")]
    pub last_updated_block: u64,
}

impl From<TokenHolder> for TokenHolderNode {
    fn from(holder: TokenHolder) -> Self {
        Self {
            token: holder.token,
            holder: holder.holder,
            balance: holder.balance,
            last_updated_block: holder.last_updated_block,
        }
    }
}

impl WireObject for TokenHolderNode {
    const TYPE_NAME: &'static str = "TokenHolder";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("token", string_nn()),
            wire_field("holder", string_nn()),
            wire_field("balance", string_nn()),
            wire_field("lastUpdatedBlock", string_nn()),
        ]
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedAddressNode {
    pub address: Address,
    pub label: Option<String>,
    pub added_at: Option<String>,
}

impl From<WatchedAddress> for WatchedAddressNode {
    fn from(entry: WatchedAddress) -> Self {
        Self { address: entry.address, label: entry.label, added_at: rfc3339(entry.added_at) }
    }
}

impl WireObject for WatchedAddressNode {
    const TYPE_NAME: &'static str = "WatchedAddress";

    fn describe() -> Vec<WireField> {
        vec![
            wire_field("address", string_nn()),
            wire_field("label", string()),
            wire_field("addedAt", string()),
        ]
    }
}
