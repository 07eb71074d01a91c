// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! Core chain queries: head, blocks, transactions, balances.

use std::sync::Arc;

use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::ObjectAccessor;
use async_graphql::dynamic::TypeRef;

use super::resolve;
use crate::defaults::LARGE_PAGE_SIZE;
use crate::defaults::PAGE_SIZE;
use crate::schema::args::address_arg;
use crate::schema::args::number_arg;
use crate::schema::args::parse_block_number;
use crate::schema::args::parse_hash;
use crate::schema::args::required;
use crate::schema::args::string_arg;
use crate::schema::args::PaginationArgs;
use crate::schema::builder::FieldRegistration;
use crate::schema::builder::SchemaBuilder;
use crate::schema::connection::connection_type_name;
use crate::schema::connection::Connection;
use crate::schema::error::QueryError;
use crate::schema::types::BlockNode;
use crate::schema::types::TransactionNode;
use crate::schema::wire::wire_some;
use crate::schema::wire::wire_value;
use crate::schema::wire::WireObject;
use crate::storage::Address;
use crate::storage::Hash;
use crate::storage::NotFoundExt;
use crate::storage::Page;
use crate::storage::Storage;

pub(crate) fn register(builder: SchemaBuilder) -> SchemaBuilder {
    let storage = builder.storage();
    builder
        .with_connection::<BlockNode>()
        .with_connection::<TransactionNode>()
        .query(chain_height(storage.clone()))
        .query(block(storage.clone()))
        .query(latest_blocks(storage.clone()))
        .query(blocks(storage.clone()))
        .query(transaction(storage.clone()))
        .query(block_transactions(storage.clone()))
        .query(balance(storage))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BlockSelector {
    Number(u64),
    Hash(Hash),
}

impl BlockSelector {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        match (string_arg(args, "number")?, string_arg(args, "hash")?) {
            (Some(number), None) => Ok(Self::Number(parse_block_number("number", &number)?)),
            (None, Some(hash)) => Ok(Self::Hash(parse_hash("hash", &hash)?)),
            _ => {
                Err(QueryError::invalid("number", "exactly one of `number` or `hash` is required"))
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct BlockRangeArgs {
    number_from: u64,
    number_to: u64,
    paging: PaginationArgs,
}

impl BlockRangeArgs {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        let number_from = required("numberFrom", number_arg(args, "numberFrom")?)?;
        let number_to = required("numberTo", number_arg(args, "numberTo")?)?;
        if number_from > number_to {
            return Err(QueryError::invalid("numberFrom", "must not exceed `numberTo`"));
        }
        let paging = PaginationArgs::parse(args, PAGE_SIZE)?;
        Ok(Self { number_from, number_to, paging })
    }
}

#[derive(Clone, Copy, Debug)]
struct BlockTransactionsArgs {
    number: u64,
    paging: PaginationArgs,
}

impl BlockTransactionsArgs {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        let number = required("number", number_arg(args, "number")?)?;
        let paging = PaginationArgs::parse(args, LARGE_PAGE_SIZE)?;
        Ok(Self { number, paging })
    }
}

#[derive(Clone, Copy, Debug)]
struct BalanceArgs {
    address: Address,
    block_number: Option<u64>,
}

impl BalanceArgs {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        Ok(Self {
            address: address_arg(args, "address")?,
            block_number: number_arg(args, "blockNumber")?,
        })
    }
}

fn chain_height(storage: Arc<dyn Storage>) -> FieldRegistration {
    FieldRegistration::new("chainHeight", TypeRef::named_nn(TypeRef::STRING), move |_| {
        let storage = storage.clone();
        resolve(async move {
            let height = storage.latest_height().await?;
            wire_some(&height.to_string())
        })
    })
    .description("Number of the latest indexed block")
}

fn block(storage: Arc<dyn Storage>) -> FieldRegistration {
    FieldRegistration::new("block", TypeRef::named(BlockNode::TYPE_NAME), move |ctx| {
        let storage = storage.clone();
        let selector = BlockSelector::parse(&ctx.args);
        resolve(async move {
            let block = match selector? {
                BlockSelector::Number(number) => storage.block_by_number(number).await,
                BlockSelector::Hash(hash) => storage.block_by_hash(&hash).await,
            };
            block.found()?.map(|block| wire_value(&BlockNode::from(block))).transpose()
        })
    })
    .argument(InputValue::new("number", TypeRef::named(TypeRef::STRING)))
    .argument(InputValue::new("hash", TypeRef::named(TypeRef::STRING)))
}

fn latest_blocks(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn(connection_type_name(BlockNode::TYPE_NAME));
    FieldRegistration::new("latestBlocks", returns, move |ctx| {
        let storage = storage.clone();
        let paging = PaginationArgs::parse(&ctx.args, PAGE_SIZE);
        resolve(async move {
            let paging = paging?;
            let offset = paging.offset as u64;
            let Some(latest) = storage.latest_height().await.found()? else {
                return wire_some(&Connection::<BlockNode>::empty(offset, 0));
            };
            let nodes: Vec<BlockNode> = match paging.reverse_window(latest) {
                Some(window) => {
                    tracing::trace!(target: "resolver", "latestBlocks window {window}");
                    let mut blocks = storage.blocks_in_range(window).await?;
                    blocks.reverse();
                    blocks.into_iter().map(BlockNode::from).collect()
                }
                None => Vec::new(),
            };
            wire_some(&Connection::new(nodes, offset, Some(latest.saturating_add(1))))
        })
    })
    .description("Blocks counted back from the chain head, newest first")
    .arguments(PaginationArgs::inputs(PAGE_SIZE))
}

fn blocks(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn(connection_type_name(BlockNode::TYPE_NAME));
    FieldRegistration::new("blocks", returns, move |ctx| {
        let storage = storage.clone();
        let args = BlockRangeArgs::parse(&ctx.args);
        resolve(async move {
            let BlockRangeArgs { number_from, number_to, paging } = args?;
            let offset = paging.offset as u64;
            let latest = storage.latest_height().await.found()?;
            let Some(latest) = latest.filter(|latest| number_from <= *latest) else {
                return wire_some(&Connection::<BlockNode>::empty(offset, 0));
            };
            let number_to = number_to.min(latest);
            let nodes: Vec<BlockNode> = match paging.forward_window(number_from, number_to) {
                Some(window) => {
                    tracing::trace!(target: "resolver", "blocks window {window}");
                    let blocks = storage.blocks_in_range(window).await?;
                    blocks.into_iter().map(BlockNode::from).collect()
                }
                None => Vec::new(),
            };
            let total_count = number_to - number_from + 1;
            wire_some(&Connection::new(nodes, offset, Some(total_count)))
        })
    })
    .description("Blocks of `[numberFrom, numberTo]` in ascending order")
    .argument(InputValue::new("numberFrom", TypeRef::named_nn(TypeRef::STRING)))
    .argument(InputValue::new("numberTo", TypeRef::named_nn(TypeRef::STRING)))
    .arguments(PaginationArgs::inputs(PAGE_SIZE))
}

fn transaction(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named(TransactionNode::TYPE_NAME);
    FieldRegistration::new("transaction", returns, move |ctx| {
        let storage = storage.clone();
        let hash = string_arg(&ctx.args, "hash")
            .and_then(|hash| required("hash", hash))
            .and_then(|hash| parse_hash("hash", &hash));
        resolve(async move {
            let tx = storage.transaction_by_hash(&hash?).await.found()?;
            tx.map(|tx| wire_value(&TransactionNode::from(tx))).transpose()
        })
    })
    .argument(InputValue::new("hash", TypeRef::named_nn(TypeRef::STRING)))
}

fn block_transactions(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn(connection_type_name(TransactionNode::TYPE_NAME));
    FieldRegistration::new("blockTransactions", returns, move |ctx| {
        let storage = storage.clone();
        let args = BlockTransactionsArgs::parse(&ctx.args);
        resolve(async move {
            let BlockTransactionsArgs { number, paging } = args?;
            let offset = paging.offset as u64;
            let connection = match storage.block_transactions(number).await.found()? {
                Some(txs) => Connection::<TransactionNode>::from_page(
                    Page::slice(txs, paging.limit(), paging.offset()),
                    offset,
                ),
                None => Connection::empty(offset, 0),
            };
            wire_some(&connection)
        })
    })
    .argument(InputValue::new("number", TypeRef::named_nn(TypeRef::STRING)))
    .arguments(PaginationArgs::inputs(LARGE_PAGE_SIZE))
}

fn balance(storage: Arc<dyn Storage>) -> FieldRegistration {
    FieldRegistration::new("balance", TypeRef::named_nn(TypeRef::STRING), move |ctx| {
        let storage = storage.clone();
        let args = BalanceArgs::parse(&ctx.args);
        resolve(async move {
            let BalanceArgs { address, block_number } = args?;
            let balance = storage.balance(&address, block_number).await?;
            wire_some(&balance.to_string())
        })
    })
    .description("Native balance in base units, at `blockNumber` or at the head")
    .argument(InputValue::new("address", TypeRef::named_nn(TypeRef::STRING)))
    .argument(InputValue::new("blockNumber", TypeRef::named(TypeRef::STRING)))
}
