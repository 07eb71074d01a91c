// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::future::Future;

use async_graphql::dynamic::FieldFuture;
use async_graphql::dynamic::FieldValue;
use async_graphql::ErrorExtensions;

use super::error::QueryError;

pub(super) mod address;
pub(super) mod analytics;
pub(super) mod chain;
pub(super) mod delegation;
pub(super) mod historical;
pub(super) mod system_contracts;
pub(super) mod token_holders;
pub(super) mod watchlist;

/// Runs a resolver body, turning `QueryError` into a GraphQL error with a
/// `code` extension.
pub(super) fn resolve<'a, Fut>(future: Fut) -> FieldFuture<'a>
where
    Fut: Future<Output = Result<Option<FieldValue<'a>>, QueryError>> + Send + 'a,
{
    FieldFuture::new(async move {
        future.await.map_err(|err| {
            match &err {
                QueryError::Storage(_) | QueryError::Encode { .. } => {
                    tracing::error!(target: "resolver", "{err}")
                }
                _ => tracing::debug!(target: "resolver", "{err}"),
            }
            err.extend()
        })
    })
}
