// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! Governance proposals and the validator set.

use std::sync::Arc;

use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::ObjectAccessor;
use async_graphql::dynamic::TypeRef;
use async_graphql::Value;

use super::resolve;
use crate::defaults::PAGE_SIZE;
use crate::schema::args::bool_arg;
use crate::schema::args::enum_arg;
use crate::schema::args::number_arg;
use crate::schema::args::required;
use crate::schema::args::PaginationArgs;
use crate::schema::builder::FieldRegistration;
use crate::schema::builder::SchemaBuilder;
use crate::schema::connection::connection_type_name;
use crate::schema::connection::Connection;
use crate::schema::error::QueryError;
use crate::schema::types::proposal_status_enum;
use crate::schema::types::ProposalNode;
use crate::schema::types::ValidatorNode;
use crate::schema::types::PROPOSAL_STATUS;
use crate::schema::wire::wire_list;
use crate::schema::wire::wire_some;
use crate::schema::wire::wire_value;
use crate::schema::wire::WireObject;
use crate::storage::NotFoundExt;
use crate::storage::ProposalStatus;
use crate::storage::Storage;

pub(crate) fn register(builder: SchemaBuilder) -> SchemaBuilder {
    let storage = builder.storage();
    builder
        .with_type(PROPOSAL_STATUS, || proposal_status_enum().into())
        .with_connection::<ProposalNode>()
        .with_wire::<ValidatorNode>()
        .query(proposals(storage.clone()))
        .query(proposal(storage.clone()))
        .query(validators(storage))
}

#[derive(Clone, Copy, Debug)]
struct ProposalsArgs {
    status: Option<ProposalStatus>,
    paging: PaginationArgs,
}

impl ProposalsArgs {
    fn parse(args: &ObjectAccessor<'_>) -> Result<Self, QueryError> {
        let status = enum_arg(args, "status")?
            .map(|status| status.parse().map_err(|err| QueryError::invalid("status", err)))
            .transpose()?;
        let paging = PaginationArgs::parse(args, PAGE_SIZE)?;
        Ok(Self { status, paging })
    }
}

fn proposals(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn(connection_type_name(ProposalNode::TYPE_NAME));
    FieldRegistration::new("proposals", returns, move |ctx| {
        let storage = storage.clone();
        let args = ProposalsArgs::parse(&ctx.args);
        resolve(async move {
            let ProposalsArgs { status, paging } = args?;
            let page = storage.proposals(status, paging.limit(), paging.offset()).await?;
            wire_some(&Connection::<ProposalNode>::from_page(page, paging.offset as u64))
        })
    })
    .description("Governance proposals, newest first")
    .argument(InputValue::new("status", TypeRef::named(PROPOSAL_STATUS)))
    .arguments(PaginationArgs::inputs(PAGE_SIZE))
}

fn proposal(storage: Arc<dyn Storage>) -> FieldRegistration {
    FieldRegistration::new("proposal", TypeRef::named(ProposalNode::TYPE_NAME), move |ctx| {
        let storage = storage.clone();
        let id = number_arg(&ctx.args, "id").and_then(|id| required("id", id));
        resolve(async move {
            let proposal = storage.proposal(id?).await.found()?;
            proposal.map(|proposal| wire_value(&ProposalNode::from(proposal))).transpose()
        })
    })
    .argument(InputValue::new("id", TypeRef::named_nn(TypeRef::STRING)))
}

fn validators(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn_list_nn(ValidatorNode::TYPE_NAME);
    FieldRegistration::new("validators", returns, move |ctx| {
        let storage = storage.clone();
        let active_only = bool_arg(&ctx.args, "activeOnly").map(|flag| flag.unwrap_or(false));
        resolve(async move {
            let active_only = active_only?;
            let nodes = storage
                .validators()
                .await?
                .into_iter()
                .filter(|validator| !active_only || validator.active)
                .map(ValidatorNode::from)
                .collect::<Vec<_>>();
            wire_list(&nodes)
        })
    })
    .argument(
        InputValue::new("activeOnly", TypeRef::named(TypeRef::BOOLEAN))
            .default_value(Value::from(false)),
    )
}
