// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! Set-code delegation authorizations, looked up from either side.

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
use crate::schema::capability::require_set_code_authorizations;
use crate::schema::connection::connection_type_name;
use crate::schema::connection::Connection;
use crate::schema::error::QueryError;
use crate::schema::types::SetCodeAuthorizationNode;
use crate::schema::wire::wire_some;
use crate::schema::wire::WireObject;
use crate::storage::Address;
use crate::storage::Storage;

pub(crate) fn register(builder: SchemaBuilder) -> SchemaBuilder {
    let storage = builder.storage();
    builder
        .with_connection::<SetCodeAuthorizationNode>()
        .query(authorizations(storage.clone(), Side::Authority))
        .query(authorizations(storage, Side::Target))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Authority,
    Target,
}

impl Side {
    fn field_name(&self) -> &'static str {
        match self {
            Side::Authority => "authorizationsByAuthority",
            Side::Target => "authorizationsByTarget",
        }
    }

    fn argument(&self) -> &'static str {
        match self {
            Side::Authority => "authority",
            Side::Target => "target",
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct AuthorizationsArgs {
    address: Address,
    paging: PaginationArgs,
}

impl AuthorizationsArgs {
    fn parse(args: &ObjectAccessor<'_>, side: Side) -> Result<Self, QueryError> {
        let address = address_arg(args, side.argument())?;
        let paging = PaginationArgs::parse(args, PAGE_SIZE)?;
        Ok(Self { address, paging })
    }
}

fn authorizations(storage: Arc<dyn Storage>, side: Side) -> FieldRegistration {
    let returns = TypeRef::named_nn(connection_type_name(SetCodeAuthorizationNode::TYPE_NAME));
    FieldRegistration::new(side.field_name(), returns, move |ctx| {
        let storage = storage.clone();
        let args = AuthorizationsArgs::parse(&ctx.args, side);
        resolve(async move {
            let AuthorizationsArgs { address, paging } = args?;
            let reader = require_set_code_authorizations(storage.as_ref())?;
            let page = match side {
                Side::Authority => {
                    reader.authorizations_by_authority(&address, paging.limit(), paging.offset())
                }
                Side::Target => {
                    reader.authorizations_by_target(&address, paging.limit(), paging.offset())
                }
            }
            .await?;
            let connection =
                Connection::<SetCodeAuthorizationNode>::from_page(page, paging.offset as u64);
            wire_some(&connection)
        })
    })
    .argument(InputValue::new(side.argument(), TypeRef::named_nn(TypeRef::STRING)))
    .arguments(PaginationArgs::inputs(PAGE_SIZE))
}
