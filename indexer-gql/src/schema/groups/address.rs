// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::ObjectAccessor;
use async_graphql::dynamic::TypeRef;

use super::resolve;
use crate::defaults::PAGE_SIZE;
use crate::schema::args::address_arg;
use crate::schema::args::PaginationArgs;
use crate::schema::builder::FieldRegistration;
use crate::schema::builder::SchemaBuilder;
use crate::schema::capability::require_address_activity;
use crate::schema::connection::connection_type_name;
use crate::schema::connection::Connection;
use crate::schema::error::QueryError;
use crate::schema::types::AddressStatsNode;
use crate::schema::types::TransactionNode;
use crate::schema::wire::wire_some;
use crate::schema::wire::wire_value;
use crate::schema::wire::WireObject;
use crate::storage::Address;
use crate::storage::NotFoundExt;
use crate::storage::Storage;

pub(crate) fn register(builder: SchemaBuilder) -> SchemaBuilder {
    let storage = builder.storage();
    builder
        .with_connection::<TransactionNode>()
        .with_wire::<AddressStatsNode>()
        .query(address_transactions(storage.clone()))
        .query(address_stats(storage))
}

#[derive(Clone, Copy, Debug)]
struct AddressTransactionsArgs {
    address: Address,
    paging: PaginationArgs,
}

impl AddressTransactionsArgs {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        let address = address_arg(args, "address")?;
        let paging = PaginationArgs::parse(args, PAGE_SIZE)?;
        Ok(Self { address, paging })
    }
}

fn address_transactions(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn(connection_type_name(TransactionNode::TYPE_NAME));
    FieldRegistration::new("addressTransactions", returns, move |ctx| {
        let storage = storage.clone();
        let args = AddressTransactionsArgs::parse(&ctx.args);
        resolve(async move {
            let AddressTransactionsArgs { address, paging } = args?;
            let reader = require_address_activity(storage.as_ref())?;
            let page =
                reader.address_transactions(&address, paging.limit(), paging.offset()).await?;
            wire_some(&Connection::<TransactionNode>::from_page(page, paging.offset as u64))
        })
    })
    .description("Transactions sent or received by `address`, newest first")
    .argument(InputValue::new("address", TypeRef::named_nn(TypeRef::STRING)))
    .arguments(PaginationArgs::inputs(PAGE_SIZE))
}

fn address_stats(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named(AddressStatsNode::TYPE_NAME);
    FieldRegistration::new("addressStats", returns, move |ctx| {
        let storage = storage.clone();
        let address = address_arg(&ctx.args, "address");
        resolve(async move {
            let address = address?;
            let reader = require_address_activity(storage.as_ref())?;
            let stats = reader.address_stats(&address).await.found()?;
            stats.map(|stats| wire_value(&AddressStatsNode::from(stats))).transpose()
        })
    })
    .argument(InputValue::new("address", TypeRef::named_nn(TypeRef::STRING)))
}
