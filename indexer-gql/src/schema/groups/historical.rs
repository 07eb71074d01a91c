// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::ObjectAccessor;
use async_graphql::dynamic::TypeRef;

use super::resolve;
use crate::block_range::BlockRange;
use crate::defaults::LARGE_PAGE_SIZE;
use crate::schema::args::address_arg;
use crate::schema::args::number_arg;
use crate::schema::args::required;
use crate::schema::args::PaginationArgs;
use crate::schema::builder::FieldRegistration;
use crate::schema::builder::SchemaBuilder;
use crate::schema::connection::connection_type_name;
use crate::schema::connection::Connection;
use crate::schema::error::QueryError;
use crate::schema::types::BalanceChangeNode;
use crate::schema::types::BlockNode;
use crate::schema::wire::wire_some;
use crate::schema::wire::wire_value;
use crate::schema::wire::WireObject;
use crate::storage::Address;
use crate::storage::NotFoundExt;
use crate::storage::Storage;

pub(crate) fn register(builder: SchemaBuilder) -> SchemaBuilder {
    let storage = builder.storage();
    builder
        .with_wire::<BlockNode>()
        .with_connection::<BalanceChangeNode>()
        .query(balance_history(storage.clone()))
        .query(block_at(storage))
}

#[derive(Clone, Copy, Debug)]
struct BalanceHistoryArgs {
    address: Address,
    number_from: Option<u64>,
    number_to: Option<u64>,
    paging: PaginationArgs,
}

impl BalanceHistoryArgs {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        let address = address_arg(args, "address")?;
        let number_from = number_arg(args, "numberFrom")?;
        let number_to = number_arg(args, "numberTo")?;
        if let (Some(from), Some(to)) = (number_from, number_to) {
            if from > to {
                return Err(QueryError::invalid("numberFrom", "must not exceed `numberTo`"));
            }
        }
        let paging = PaginationArgs::parse(args, LARGE_PAGE_SIZE)?;
        Ok(Self { address, number_from, number_to, paging })
    }

    /// Open bounds run from genesis to the chain head.
    fn range(&self, latest_height: u64) -> Option<BlockRange> {
        let start_block = self.number_from.unwrap_or(0);
        let end_block = self.number_to.unwrap_or(latest_height);
        BlockRange::new(start_block, end_block)
    }
}

fn balance_history(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn(connection_type_name(BalanceChangeNode::TYPE_NAME));
    FieldRegistration::new("balanceHistory", returns, move |ctx| {
        let storage = storage.clone();
        let args = BalanceHistoryArgs::parse(&ctx.args);
        resolve(async move {
            let args = args?;
            let offset = args.paging.offset as u64;
            let latest = storage.latest_height().await.found()?;
            let Some(range) = latest.and_then(|latest| args.range(latest)) else {
                return wire_some(&Connection::<BalanceChangeNode>::empty(offset, 0));
            };
            let page = storage
                .balance_history(&args.address, range, args.paging.limit(), args.paging.offset())
                .await?;
            wire_some(&Connection::<BalanceChangeNode>::from_page(page, offset))
        })
    })
    .description("Balance changes of `address`, newest first")
    .argument(InputValue::new("address", TypeRef::named_nn(TypeRef::STRING)))
    .argument(InputValue::new("numberFrom", TypeRef::named(TypeRef::STRING)))
    .argument(InputValue::new("numberTo", TypeRef::named(TypeRef::STRING)))
    .arguments(PaginationArgs::inputs(LARGE_PAGE_SIZE))
}

fn block_at(storage: Arc<dyn Storage>) -> FieldRegistration {
    FieldRegistration::new("blockAt", TypeRef::named(BlockNode::TYPE_NAME), move |ctx| {
        let storage = storage.clone();
        let timestamp = number_arg(&ctx.args, "timestamp")
            .and_then(|timestamp| required("timestamp", timestamp));
        resolve(async move {
            let block = storage.block_at_or_before(timestamp?).await.found()?;
            block.map(|block| wire_value(&BlockNode::from(block))).transpose()
        })
    })
    .description("Latest block produced at or before a unix `timestamp`")
    .argument(InputValue::new("timestamp", TypeRef::named_nn(TypeRef::STRING)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(number_from: Option<u64>, number_to: Option<u64>) -> BalanceHistoryArgs {
        BalanceHistoryArgs {
            address: Address::from_low_u64(1),
            number_from,
            number_to,
            paging: PaginationArgs::new(10, 0).unwrap(),
        }
    }

    #[test]
    fn test_open_bounds_cover_the_chain() {
        assert_eq!(args(None, None).range(50), BlockRange::new(0, 50));
        assert_eq!(args(Some(10), None).range(50), BlockRange::new(10, 50));
        assert_eq!(args(None, Some(70)).range(50), BlockRange::new(0, 70));
        assert_eq!(args(Some(60), None).range(50), None);
    }
}
