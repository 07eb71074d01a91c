// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::ObjectAccessor;
use async_graphql::dynamic::TypeRef;

use super::resolve;
use crate::defaults::LARGE_PAGE_SIZE;
use crate::defaults::MAX_LABEL_LENGTH;
use crate::schema::args::address_arg;
use crate::schema::args::string_arg;
use crate::schema::args::PaginationArgs;
use crate::schema::builder::FieldRegistration;
use crate::schema::builder::SchemaBuilder;
use crate::schema::connection::connection_type_name;
use crate::schema::connection::Connection;
use crate::schema::error::QueryError;
use crate::schema::types::WatchedAddressNode;
use crate::schema::wire::wire_some;
use crate::schema::wire::WireObject;
use crate::storage::Address;
use crate::storage::WatchlistStore;

pub(crate) fn register(builder: SchemaBuilder, store: Arc<dyn WatchlistStore>) -> SchemaBuilder {
    builder
        .with_connection::<WatchedAddressNode>()
        .query(watched_addresses(store.clone()))
        .mutation(watch_address(store.clone()))
        .mutation(unwatch_address(store))
}

#[derive(Clone, Debug)]
struct WatchArgs {
    address: Address,
    label: Option<String>,
}

impl WatchArgs {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        let address = address_arg(args, "address")?;
        let label = string_arg(args, "label")?.map(|label| label.trim().to_string());
        if let Some(label) = &label {
            if label.chars().count() > MAX_LABEL_LENGTH {
                let reason = format!("must be at most {MAX_LABEL_LENGTH} characters");
                return Err(QueryError::invalid("label", reason));
            }
        }
        Ok(Self { address, label: label.filter(|label| !label.is_empty()) })
    }
}

fn watched_addresses(store: Arc<dyn WatchlistStore>) -> FieldRegistration {
    let returns = TypeRef::named_nn(connection_type_name(WatchedAddressNode::TYPE_NAME));
    FieldRegistration::new("watchedAddresses", returns, move |ctx| {
        let store = store.clone();
        let paging = PaginationArgs::parse(&ctx.args, LARGE_PAGE_SIZE);
        resolve(async move {
            let paging = paging?;
            let page = store.list(paging.limit(), paging.offset()).await?;
            wire_some(&Connection::<WatchedAddressNode>::from_page(page, paging.offset as u64))
        })
    })
    .arguments(PaginationArgs::inputs(LARGE_PAGE_SIZE))
}

fn watch_address(store: Arc<dyn WatchlistStore>) -> FieldRegistration {
    let returns = TypeRef::named_nn(WatchedAddressNode::TYPE_NAME);
    FieldRegistration::new("watchAddress", returns, move |ctx| {
        let store = store.clone();
        let args = WatchArgs::parse(&ctx.args);
        resolve(async move {
            let WatchArgs { address, label } = args?;
            let entry = store.watch(address, label).await?;
            tracing::info!(target: "resolver", "watching {address}");
            wire_some(&WatchedAddressNode::from(entry))
        })
    })
    .description("Adds an address to the watchlist or relabels it")
    .argument(InputValue::new("address", TypeRef::named_nn(TypeRef::STRING)))
    .argument(InputValue::new("label", TypeRef::named(TypeRef::STRING)))
}

fn unwatch_address(store: Arc<dyn WatchlistStore>) -> FieldRegistration {
    FieldRegistration::new("unwatchAddress", TypeRef::named_nn(TypeRef::BOOLEAN), move |ctx| {
        let store = store.clone();
        let address = address_arg(&ctx.args, "address");
        resolve(async move {
            let removed = store.unwatch(&address?).await?;
            wire_some(&removed)
        })
    })
    .description("`false` when the address was not watched")
    .argument(InputValue::new("address", TypeRef::named_nn(TypeRef::STRING)))
}
