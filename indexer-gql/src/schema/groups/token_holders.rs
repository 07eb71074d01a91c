// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::ObjectAccessor;
use async_graphql::dynamic::TypeRef;

use super::resolve;
use crate::defaults::LARGE_PAGE_SIZE;
use crate::schema::args::address_arg;
use crate::schema::args::PaginationArgs;
use crate::schema::builder::FieldRegistration;
use crate::schema::builder::SchemaBuilder;
use crate::schema::capability::require_token_holders;
use crate::schema::connection::connection_type_name;
use crate::schema::connection::Connection;
use crate::schema::error::QueryError;
use crate::schema::types::TokenHolderNode;
use crate::schema::wire::wire_some;
use crate::schema::wire::wire_value;
use crate::schema::wire::WireObject;
use crate::storage::Address;
use crate::storage::NotFoundExt;
use crate::storage::Storage;

pub(crate) fn register(builder: SchemaBuilder) -> SchemaBuilder {
    let storage = builder.storage();
    builder
        .with_connection::<TokenHolderNode>()
        .query(token_holders(storage.clone()))
        .query(token_balance(storage))
}

#[derive(Clone, Copy, Debug)]
struct TokenHoldersArgs {
    token: Address,
    paging: PaginationArgs,
}

impl TokenHoldersArgs {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        let token = address_arg(args, "token")?;
        let paging = PaginationArgs::parse(args, LARGE_PAGE_SIZE)?;
        Ok(Self { token, paging })
    }
}

#[derive(Clone, Copy, Debug)]
struct TokenBalanceArgs {
    token: Address,
    holder: Address,
}

impl TokenBalanceArgs {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        Ok(Self { token: address_arg(args, "token")?, holder: address_arg(args, "holder")? })
    }
}

fn token_holders(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn(connection_type_name(TokenHolderNode::TYPE_NAME));
    FieldRegistration::new("tokenHolders", returns, move |ctx| {
        let storage = storage.clone();
        let args = TokenHoldersArgs::parse(&ctx.args);
        resolve(async move {
            let TokenHoldersArgs { token, paging } = args?;
            let reader = require_token_holders(storage.as_ref())?;
            let page = reader.token_holders(&token, paging.limit(), paging.offset()).await?;
            wire_some(&Connection::<TokenHolderNode>::from_page(page, paging.offset as u64))
        })
    })
    .description("Holders of `token`, largest balance first")
    .argument(InputValue::new("token", TypeRef::named_nn(TypeRef::STRING)))
    .arguments(PaginationArgs::inputs(LARGE_PAGE_SIZE))
}

fn token_balance(storage: Arc<dyn Storage>) -> FieldRegistration {
    FieldRegistration::new("tokenBalance", TypeRef::named(TokenHolderNode::TYPE_NAME), move |ctx| {
        let storage = storage.clone();
        let args = TokenBalanceArgs::parse(&ctx.args);
        resolve(async move {
            let TokenBalanceArgs { token, holder } = args?;
            let reader = require_token_holders(storage.as_ref())?;
            let record = reader.token_balance(&token, &holder).await.found()?;
            record.map(|record| wire_value(&TokenHolderNode::from(record))).transpose()
        })
    })
    .argument(InputValue::new("token", TypeRef::named_nn(TypeRef::STRING)))
    .argument(InputValue::new("holder", TypeRef::named_nn(TypeRef::STRING)))
}
