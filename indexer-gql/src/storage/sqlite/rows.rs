// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::str::FromStr;

use num::BigUint;
use sqlx::prelude::FromRow;

use crate::storage::models::*;
use crate::storage::StorageError;
use crate::storage::StorageResult;

pub(super) const BLOCK_COLUMNS: &str =
    "number, hash, parent_hash, timestamp, miner, gas_used, gas_limit, transaction_count";
pub(super) const TRANSACTION_COLUMNS: &str =
    "hash, block_number, tx_index, from_address, to_address, value, gas_used, success";
pub(super) const BALANCE_CHANGE_COLUMNS: &str =
    "address, block_number, transaction_hash, previous, current";
pub(super) const PROPOSAL_COLUMNS: &str = "id, proposer, status, description, \
     created_at_block, voting_ends_at_block, votes_for, votes_against";
pub(super) const VALIDATOR_COLUMNS: &str = "address, operator, stake, commission_bps, active";

#[derive(Clone, Debug, FromRow)]
pub(super) struct BlockRow {
    pub number: i64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: i64,
    pub miner: String,
    pub gas_used: i64,
    pub gas_limit: i64,
    pub transaction_count: i64,
}

#[derive(Clone, Debug, FromRow)]
pub(super) struct TransactionRow {
    pub hash: String,
    pub block_number: i64,
    pub tx_index: i64,
    pub from_address: String,
    pub to_address: Option<String>,
    pub value: String,
    pub gas_used: i64,
    pub success: bool,
}

#[derive(Clone, Debug, FromRow)]
pub(super) struct BalanceChangeRow {
    pub address: String,
    pub block_number: i64,
    pub transaction_hash: Option<String>,
    pub previous: String,
    pub current: String,
}

#[derive(Clone, Debug, FromRow)]
pub(super) struct ProposalRow {
    pub id: i64,
    pub proposer: String,
    pub status: String,
    pub description: String,
    pub created_at_block: i64,
    pub voting_ends_at_block: i64,
    pub votes_for: String,
    pub votes_against: String,
}

#[derive(Clone, Debug, FromRow)]
pub(super) struct ValidatorRow {
    pub address: String,
    pub operator: String,
    pub stake: String,
    pub commission_bps: i64,
    pub active: bool,
}

/// Heights and ids are bound as `i64`; anything above `i64::MAX` cannot be
/// stored, so clamping keeps comparisons correct.
pub(super) fn to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn unsigned<T: TryFrom<i64>>(column: &str, value: i64) -> StorageResult<T> {
    T::try_from(value).map_err(|_| StorageError::Corrupted(format!("{column}: {value}")))
}

fn parse<T: FromStr>(column: &str, value: &str) -> StorageResult<T> {
    value.parse().map_err(|_| StorageError::Corrupted(format!("{column}: {value:?}")))
}

pub(super) fn parse_amount(column: &str, value: &str) -> StorageResult<BigUint> {
    BigUint::parse_bytes(value.as_bytes(), 10)
        .ok_or_else(|| StorageError::Corrupted(format!("{column}: {value:?}")))
}

impl TryFrom<BlockRow> for Block {
    type Error = StorageError;

    fn try_from(row: BlockRow) -> StorageResult<Self> {
        Ok(Block {
            number: unsigned("blocks.number", row.number)?,
            hash: parse("blocks.hash", &row.hash)?,
            parent_hash: parse("blocks.parent_hash", &row.parent_hash)?,
            timestamp: unsigned("blocks.timestamp", row.timestamp)?,
            miner: parse("blocks.miner", &row.miner)?,
            gas_used: unsigned("blocks.gas_used", row.gas_used)?,
            gas_limit: unsigned("blocks.gas_limit", row.gas_limit)?,
            transaction_count: unsigned("blocks.transaction_count", row.transaction_count)?,
        })
    }
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = StorageError;

    fn try_from(row: TransactionRow) -> StorageResult<Self> {
        Ok(Transaction {
            hash: parse("transactions.hash", &row.hash)?,
            block_number: unsigned("transactions.block_number", row.block_number)?,
            index: unsigned("transactions.tx_index", row.tx_index)?,
            from: parse("transactions.from_address", &row.from_address)?,
            to: row
                .to_address
                .as_deref()
                .map(|to| parse("transactions.to_address", to))
                .transpose()?,
            value: parse_amount("transactions.value", &row.value)?,
            gas_used: unsigned("transactions.gas_used", row.gas_used)?,
            success: row.success,
        })
    }
}

impl TryFrom<BalanceChangeRow> for BalanceChange {
    type Error = StorageError;

    fn try_from(row: BalanceChangeRow) -> StorageResult<Self> {
        Ok(BalanceChange {
            address: parse("balance_changes.address", &row.address)?,
            block_number: unsigned("balance_changes.block_number", row.block_number)?,
            transaction_hash: row
                .transaction_hash
                .as_deref()
                .map(|hash| parse("balance_changes.transaction_hash", hash))
                .transpose()?,
            previous: parse_amount("balance_changes.previous", &row.previous)?,
            current: parse_amount("balance_changes.current", &row.current)?,
        })
    }
}

impl TryFrom<ProposalRow> for Proposal {
    type Error = StorageError;

    fn try_from(row: ProposalRow) -> StorageResult<Self> {
        Ok(Proposal {
            id: unsigned("proposals.id", row.id)?,
            proposer: parse("proposals.proposer", &row.proposer)?,
            status: parse("proposals.status", &row.status)?,
            description: row.description,
            created_at_block: unsigned("proposals.created_at_block", row.created_at_block)?,
            voting_ends_at_block: unsigned(
                "proposals.voting_ends_at_block",
                row.voting_ends_at_block,
            )?,
            votes_for: parse_amount("proposals.votes_for", &row.votes_for)?,
            votes_against: parse_amount("proposals.votes_against", &row.votes_against)?,
        })
    }
}

impl TryFrom<ValidatorRow> for Validator {
    type Error = StorageError;

    fn try_from(row: ValidatorRow) -> StorageResult<Self> {
        Ok(Validator {
            address: parse("validators.address", &row.address)?,
            operator: parse("validators.operator", &row.operator)?,
            stake: parse_amount("validators.stake", &row.stake)?,
            commission_bps: unsigned("validators.commission_bps", row.commission_bps)?,
            active: row.active,
        })
    }
}

pub(super) fn convert_all<R, T>(rows: Vec<R>) -> StorageResult<Vec<T>>
where
    T: TryFrom<R, Error = StorageError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupted_rows_are_reported() {
        let row = BlockRow {
            number: -1,
            hash: format!("0x{}", "00".repeat(32)),
            parent_hash: format!("0x{}", "00".repeat(32)),
            timestamp: 0,
            miner: format!("0x{}", "00".repeat(20)),
            gas_used: 0,
            gas_limit: 0,
            transaction_count: 0,
        };
        let err = Block::try_from(row).unwrap_err();
        assert!(matches!(err, StorageError::Corrupted(ref what) if what == "blocks.number: -1"));
    }

    #[test]
    fn test_amounts_are_base_10() {
        assert_eq!(parse_amount("x", "1000").unwrap(), BigUint::from(1000u32));
        assert!(parse_amount("x", "0x10").is_err());
        assert!(parse_amount("x", "").is_err());
    }
}
