// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::TypeRef;
use async_graphql::Value;

use super::resolve;
use crate::block_range::reverse_window;
use crate::defaults::ACTIVITY_WINDOW;
use crate::defaults::MAX_PAGE_SIZE;
use crate::schema::args::int_arg;
use crate::schema::builder::FieldRegistration;
use crate::schema::builder::SchemaBuilder;
use crate::schema::error::QueryError;
use crate::schema::types::ActivityWindowNode;
use crate::schema::types::NetworkStatsNode;
use crate::schema::wire::wire_some;
use crate::schema::wire::WireObject;
use crate::storage::NotFoundExt;
use crate::storage::Storage;

pub(crate) fn register(builder: SchemaBuilder) -> SchemaBuilder {
    let storage = builder.storage();
    builder
        .with_wire::<NetworkStatsNode>()
        .with_wire::<ActivityWindowNode>()
        .query(network_stats(storage.clone()))
        .query(recent_activity(storage))
}

fn network_stats(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn(NetworkStatsNode::TYPE_NAME);
    FieldRegistration::new("networkStats", returns, move |_| {
        let storage = storage.clone();
        resolve(async move {
            let stats = storage.network_stats().await?;
            wire_some(&NetworkStatsNode::from(stats))
        })
    })
}

fn window_size(blocks: Option<i64>) -> Result<i32, QueryError> {
    let blocks = blocks.unwrap_or(ACTIVITY_WINDOW as i64);
    i32::try_from(blocks)
        .ok()
        .filter(|blocks| (1..=MAX_PAGE_SIZE).contains(blocks))
        .ok_or_else(|| {
            QueryError::invalid("blocks", format!("must be between 1 and {MAX_PAGE_SIZE}"))
        })
}

fn recent_activity(storage: Arc<dyn Storage>) -> FieldRegistration {
    let returns = TypeRef::named_nn(ActivityWindowNode::TYPE_NAME);
    FieldRegistration::new("recentActivity", returns, move |ctx| {
        let storage = storage.clone();
        let blocks = int_arg(&ctx.args, "blocks").and_then(window_size);
        resolve(async move {
            let blocks = blocks?;
            let window = match storage.latest_height().await.found()? {
                Some(latest) => reverse_window(latest, 0, blocks),
                None => None,
            };
            let found = match window {
                Some(window) => storage.blocks_in_range(window).await?,
                None => Vec::new(),
            };
            wire_some(&ActivityWindowNode::aggregate(window, &found))
        })
    })
    .description("Aggregates over the most recent `blocks` blocks")
    .argument(
        InputValue::new("blocks", TypeRef::named(TypeRef::INT))
            .default_value(Value::from(ACTIVITY_WINDOW)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_size_bounds() {
        assert_eq!(window_size(None).unwrap(), ACTIVITY_WINDOW);
        assert_eq!(window_size(Some(1)).unwrap(), 1);
        assert!(window_size(Some(0)).is_err());
        assert!(window_size(Some(MAX_PAGE_SIZE as i64 + 1)).is_err());
        assert!(window_size(Some(i64::MAX)).is_err());
    }
}
