// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use num::BigUint;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::time;

use self::rows::*;
use super::models::*;
use super::AddressActivityReader;
use super::Storage;
use super::StorageError;
use super::StorageResult;
use crate::block_range::BlockRange;
use crate::defaults;

mod rows;

/// Read-only backend over an indexer SQLite database.
///
/// Provides the address activity capability when the database carries the
/// `address_transactions` table.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pool: SqlitePool,
    address_index: bool,
}

impl SqliteStorage {
    /// Opens `url` read-only, retrying while the indexer creates the file.
    pub async fn open(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("DB url: {url}"))?
            .read_only(true);
        let mut interval = time::interval(Duration::from_secs(defaults::DB_OPEN_INTERVAL));
        let mut attempt: u16 = 0;
        let pool = loop {
            interval.tick().await;

            let res = SqlitePoolOptions::new()
                .max_connections(defaults::MAX_POOL_CONNECTIONS)
                .connect_with(options.clone())
                .await
                .with_context(|| format!("DB file: {url}"));

            match res {
                Ok(pool) => break pool,
                Err(err) => {
                    attempt += 1;
                    if attempt >= defaults::DB_OPEN_ATTEMPTS {
                        anyhow::bail!("Failed to open DB file {url}: timeout");
                    }
                    tracing::error!("{err:?}");
                }
            }
        };
        Ok(Self::with_pool(pool).await?)
    }

    pub async fn with_pool(pool: SqlitePool) -> StorageResult<Self> {
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name = 'address_transactions'",
        )
        .fetch_one(&pool)
        .await?;
        let address_index = tables > 0;
        tracing::debug!("address_transactions table present: {address_index}");
        Ok(Self { pool, address_index })
    }

    async fn count(&self, sql: &str, bind: Option<&str>) -> StorageResult<u64> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        if let Some(value) = bind {
            query = query.bind(value.to_string());
        }
        let count = query.fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn block_where(&self, filter: &str, value: i64) -> StorageResult<Option<Block>> {
        let sql = format!("SELECT {BLOCK_COLUMNS} FROM blocks {filter} LIMIT 1");
        tracing::trace!("SQL: {sql}");
        sqlx::query_as::<_, BlockRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .map(Block::try_from)
            .transpose()
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn latest_height(&self) -> StorageResult<u64> {
        let height: Option<i64> =
            sqlx::query_scalar("SELECT MAX(number) FROM blocks").fetch_one(&self.pool).await?;
        height
            .map(|height| height.max(0) as u64)
            .ok_or_else(|| StorageError::NotFound("chain head".to_string()))
    }

    async fn block_by_number(&self, number: u64) -> StorageResult<Block> {
        self.block_where("WHERE number = ?", to_sql(number))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("block {number}")))
    }

    async fn block_by_hash(&self, hash: &Hash) -> StorageResult<Block> {
        let sql = format!("SELECT {BLOCK_COLUMNS} FROM blocks WHERE hash = ?");
        sqlx::query_as::<_, BlockRow>(&sql)
            .bind(hash.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(Block::try_from)
            .transpose()?
            .ok_or_else(|| StorageError::NotFound(format!("block {hash}")))
    }

    async fn blocks_in_range(&self, range: BlockRange) -> StorageResult<Vec<Block>> {
        let sql = format!(
            "SELECT {BLOCK_COLUMNS} FROM blocks WHERE number BETWEEN ? AND ? ORDER BY number ASC"
        );
        tracing::trace!("SQL: {sql} {range}");
        let rows = sqlx::query_as::<_, BlockRow>(&sql)
            .bind(to_sql(range.start_block))
            .bind(to_sql(range.end_block))
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn block_at_or_before(&self, timestamp: u64) -> StorageResult<Block> {
        self.block_where("WHERE timestamp <= ? ORDER BY number DESC", to_sql(timestamp))
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("block at {timestamp}")))
    }

    async fn transaction_by_hash(&self, hash: &Hash) -> StorageResult<Transaction> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE hash = ?");
        sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(hash.to_string())
            .fetch_optional(&self.pool)
            .await?
            .map(Transaction::try_from)
            .transpose()?
            .ok_or_else(|| StorageError::NotFound(format!("transaction {hash}")))
    }

    async fn block_transactions(&self, number: u64) -> StorageResult<Vec<Transaction>> {
        self.block_by_number(number).await?;
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE block_number = ? \
             ORDER BY tx_index ASC"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(to_sql(number))
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn balance(&self, address: &Address, at: Option<u64>) -> StorageResult<BigUint> {
        let current: Option<String> = sqlx::query_scalar(
            "SELECT current FROM balance_changes WHERE address = ? AND block_number <= ? \
             ORDER BY block_number DESC LIMIT 1",
        )
        .bind(address.to_string())
        .bind(to_sql(at.unwrap_or(u64::MAX)))
        .fetch_optional(&self.pool)
        .await?;
        match current {
            Some(current) => parse_amount("balance_changes.current", &current),
            None => Ok(BigUint::default()),
        }
    }

    async fn balance_history(
        &self,
        address: &Address,
        range: BlockRange,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<BalanceChange>> {
        let filter = "WHERE address = ? AND block_number BETWEEN ? AND ?";
        let total_count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM balance_changes {filter}"))
                .bind(address.to_string())
                .bind(to_sql(range.start_block))
                .bind(to_sql(range.end_block))
                .fetch_one(&self.pool)
                .await?;
        let sql = format!(
            "SELECT {BALANCE_CHANGE_COLUMNS} FROM balance_changes {filter} \
             ORDER BY block_number DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, BalanceChangeRow>(&sql)
            .bind(address.to_string())
            .bind(to_sql(range.start_block))
            .bind(to_sql(range.end_block))
            .bind(to_sql(limit as u64))
            .bind(to_sql(offset as u64))
            .fetch_all(&self.pool)
            .await?;
        Ok(Page { items: convert_all(rows)?, total_count: Some(total_count.max(0) as u64) })
    }

    async fn network_stats(&self) -> StorageResult<NetworkStats> {
        let (first, last, first_time, last_time): (
            Option<i64>,
            Option<i64>,
            Option<i64>,
            Option<i64>,
        ) = sqlx::query_as(
            "SELECT MIN(number), MAX(number), \
             (SELECT timestamp FROM blocks ORDER BY number ASC LIMIT 1), \
             (SELECT timestamp FROM blocks ORDER BY number DESC LIMIT 1) FROM blocks",
        )
        .fetch_one(&self.pool)
        .await?;
        let total_transactions = self.count("SELECT COUNT(*) FROM transactions", None).await?;
        let total_addresses = self
            .count(
                "SELECT COUNT(*) FROM (SELECT from_address FROM transactions \
                 UNION SELECT to_address FROM transactions WHERE to_address IS NOT NULL)",
                None,
            )
            .await?;

        let average_block_time_ms = match (first, last, first_time, last_time) {
            (Some(first), Some(last), Some(first_time), Some(last_time)) if last > first => {
                let elapsed_ms = (last_time - first_time).max(0) as f64 * 1000.0;
                Some(elapsed_ms / (last - first) as f64)
            }
            _ => None,
        };
        Ok(NetworkStats {
            latest_height: last.unwrap_or_default().max(0) as u64,
            total_transactions,
            total_addresses,
            average_block_time_ms,
        })
    }

    async fn proposals(
        &self,
        status: Option<ProposalStatus>,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<Proposal>> {
        let filter = if status.is_some() { "WHERE status = ?" } else { "" };
        let status = status.map(|status| status.as_str());
        let total_count =
            self.count(&format!("SELECT COUNT(*) FROM proposals {filter}"), status).await?;

        let sql = format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals {filter} ORDER BY id DESC LIMIT ? OFFSET ?"
        );
        let mut query = sqlx::query_as::<_, ProposalRow>(&sql);
        if let Some(status) = status {
            query = query.bind(status);
        }
        let rows = query
            .bind(to_sql(limit as u64))
            .bind(to_sql(offset as u64))
            .fetch_all(&self.pool)
            .await?;
        Ok(Page { items: convert_all(rows)?, total_count: Some(total_count) })
    }

    async fn proposal(&self, id: u64) -> StorageResult<Proposal> {
        let sql = format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = ?");
        sqlx::query_as::<_, ProposalRow>(&sql)
            .bind(to_sql(id))
            .fetch_optional(&self.pool)
            .await?
            .map(Proposal::try_from)
            .transpose()?
            .ok_or_else(|| StorageError::NotFound(format!("proposal {id}")))
    }

    async fn validators(&self) -> StorageResult<Vec<Validator>> {
        let sql = format!("SELECT {VALIDATOR_COLUMNS} FROM validators ORDER BY address ASC");
        let rows = sqlx::query_as::<_, ValidatorRow>(&sql).fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    fn address_activity(&self) -> Option<&dyn AddressActivityReader> {
        self.address_index.then_some(self as &dyn AddressActivityReader)
    }
}

#[async_trait]
impl AddressActivityReader for SqliteStorage {
    async fn address_transactions(
        &self,
        address: &Address,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Page<Transaction>> {
        let address = address.to_string();
        let total_count = self
            .count("SELECT COUNT(*) FROM address_transactions WHERE address = ?", Some(&address))
            .await?;
        let columns = TRANSACTION_COLUMNS
            .split(", ")
            .map(|column| format!("t.{column}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {columns} FROM address_transactions a \
             JOIN transactions t ON t.hash = a.transaction_hash WHERE a.address = ? \
             ORDER BY t.block_number DESC, t.tx_index DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(address)
            .bind(to_sql(limit as u64))
            .bind(to_sql(offset as u64))
            .fetch_all(&self.pool)
            .await?;
        Ok(Page { items: convert_all(rows)?, total_count: Some(total_count) })
    }

    async fn address_stats(&self, address: &Address) -> StorageResult<AddressStats> {
        let (count, first, last): (i64, Option<i64>, Option<i64>) = sqlx::query_as(
            "SELECT COUNT(*), MIN(t.block_number), MAX(t.block_number) \
             FROM address_transactions a JOIN transactions t ON t.hash = a.transaction_hash \
             WHERE a.address = ?",
        )
        .bind(address.to_string())
        .fetch_one(&self.pool)
        .await?;
        if count == 0 {
            return Err(StorageError::NotFound(format!("address {address}")));
        }
        Ok(AddressStats {
            address: *address,
            transaction_count: count as u64,
            first_seen_block: first.map(|block| block.max(0) as u64),
            last_seen_block: last.map(|block| block.max(0) as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = include_str!("schema.sql");

    async fn memory_pool(with_address_index: bool) -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::raw_sql(SCHEMA).execute(&pool).await.unwrap();
        if !with_address_index {
            sqlx::query("DROP TABLE address_transactions").execute(&pool).await.unwrap();
        }
        pool
    }

    async fn insert_block(pool: &SqlitePool, number: u64, txs: u32) {
        sqlx::query(
            "INSERT INTO blocks (number, hash, parent_hash, timestamp, miner, gas_used, \
             gas_limit, transaction_count) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(number as i64)
        .bind(Hash::from_low_u64(1_000 + number).to_string())
        .bind(Hash::from_low_u64(1_000 + number.saturating_sub(1)).to_string())
        .bind(1_700_000_000 + number as i64 * 2)
        .bind(Address::from_low_u64(99).to_string())
        .bind(21_000 * txs as i64)
        .bind(30_000_000i64)
        .bind(txs as i64)
        .execute(pool)
        .await
        .unwrap();
        for index in 0..txs {
            let hash = Hash::from_low_u64(number * 100 + index as u64).to_string();
            let from = Address::from_low_u64(1).to_string();
            sqlx::query(
                "INSERT INTO transactions (hash, block_number, tx_index, from_address, \
                 to_address, value, gas_used, success) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&hash)
            .bind(number as i64)
            .bind(index as i64)
            .bind(&from)
            .bind(Address::from_low_u64(2).to_string())
            .bind("1000000000000000000000")
            .bind(21_000i64)
            .bind(true)
            .execute(pool)
            .await
            .unwrap();
            let _ = sqlx::query("INSERT INTO address_transactions VALUES (?, ?)")
                .bind(&from)
                .bind(&hash)
                .execute(pool)
                .await;
        }
    }

    #[tokio::test]
    async fn test_core_reads() {
        let pool = memory_pool(false).await;
        for number in 0..=10 {
            insert_block(&pool, number, 2).await;
        }
        let storage = SqliteStorage::with_pool(pool).await.unwrap();
        assert!(storage.address_activity().is_none());

        assert_eq!(storage.latest_height().await.unwrap(), 10);
        let range = BlockRange { start_block: 3, end_block: 5 };
        let blocks = storage.blocks_in_range(range).await.unwrap();
        assert_eq!(blocks.iter().map(|b| b.number).collect::<Vec<_>>(), vec![3, 4, 5]);

        let block = storage.block_by_hash(&blocks[0].hash).await.unwrap();
        assert_eq!(block.number, 3);
        assert_eq!(storage.block_at_or_before(1_700_000_009).await.unwrap().number, 4);

        let txs = storage.block_transactions(4).await.unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[1].value, BigUint::from(10u32).pow(21));

        let stats = storage.network_stats().await.unwrap();
        assert_eq!(stats.total_transactions, 22);
        assert_eq!(stats.total_addresses, 2);
        assert_eq!(stats.average_block_time_ms, Some(2000.0));
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let storage = SqliteStorage::with_pool(memory_pool(false).await).await.unwrap();
        assert!(matches!(storage.latest_height().await, Err(StorageError::NotFound(_))));
        assert!(matches!(storage.block_by_number(1).await, Err(StorageError::NotFound(_))));
        assert!(matches!(storage.proposal(1).await, Err(StorageError::NotFound(_))));
        assert_eq!(
            storage.balance(&Address::from_low_u64(5), None).await.unwrap(),
            BigUint::default()
        );
    }

    #[tokio::test]
    async fn test_address_activity_when_indexed() {
        let pool = memory_pool(true).await;
        for number in 0..=3 {
            insert_block(&pool, number, 1).await;
        }
        let storage = SqliteStorage::with_pool(pool).await.unwrap();
        let reader = storage.address_activity().unwrap();

        let sender = Address::from_low_u64(1);
        let page = reader.address_transactions(&sender, 2, 0).await.unwrap();
        assert_eq!(page.total_count, Some(4));
        assert_eq!(page.items[0].block_number, 3);

        let stats = reader.address_stats(&sender).await.unwrap();
        assert_eq!((stats.first_seen_block, stats.last_seen_block), (Some(0), Some(3)));
        assert!(matches!(
            reader.address_stats(&Address::from_low_u64(42)).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_proposals_filter_by_status() {
        let pool = memory_pool(false).await;
        for (id, status) in [(1, "VOTING"), (2, "EXECUTED"), (3, "VOTING")] {
            sqlx::query(
                "INSERT INTO proposals (id, proposer, status, description, created_at_block, \
                 voting_ends_at_block, votes_for, votes_against) \
                 VALUES (?, ?, ?, '', 1, 2, '0', '0')",
            )
            .bind(id as i64)
            .bind(Address::from_low_u64(id).to_string())
            .bind(status)
            .execute(&pool)
            .await
            .unwrap();
        }
        let storage = SqliteStorage::with_pool(pool).await.unwrap();

        let voting = storage.proposals(Some(ProposalStatus::Voting), 10, 0).await.unwrap();
        assert_eq!(voting.total_count, Some(2));
        assert_eq!(voting.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3, 1]);

        let all = storage.proposals(None, 1, 1).await.unwrap();
        assert_eq!(all.total_count, Some(3));
        assert_eq!(all.items[0].id, 2);
    }
}
