// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use async_graphql::dynamic;
use async_graphql::http::GraphiQLSource;
use async_graphql::Response;
use async_graphql::ServerError;
use async_graphql_warp::GraphQLBadRequest;
use async_graphql_warp::GraphQLResponse;
use tokio::time;
use warp::http::Response as HttpResponse;
use warp::http::StatusCode;
use warp::Filter;
use warp::Rejection;

use crate::schema::IndexerSchema;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub request_timeout: Duration,
}

async fn execute_with_timeout(
    schema: dynamic::Schema,
    request: async_graphql::Request,
    timeout: Duration,
) -> Response {
    match time::timeout(timeout, schema.execute(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!("request timed out after {}s", timeout.as_secs());
            let message = format!("request timed out after {}s", timeout.as_secs());
            Response::from_errors(vec![ServerError::new(message, None)])
        }
    }
}

pub async fn start(config: ServerConfig, schema: IndexerSchema) -> anyhow::Result<()> {
    let ServerConfig { listen, request_timeout } = config;

    let graphiql = warp::path!("graphql").and(warp::get()).map(|| {
        HttpResponse::builder()
            .header("content-type", "text/html")
            .body(GraphiQLSource::build().endpoint("/graphql").finish())
    });

    let graphql_post = async_graphql_warp::graphql(schema.executor()).and_then(
        move |(schema, request): (dynamic::Schema, async_graphql::Request)| async move {
            let response = execute_with_timeout(schema, request, request_timeout).await;
            Ok::<_, Infallible>(GraphQLResponse::from(response))
        },
    );

    let routes = graphql_post.or(graphiql).recover(|err: Rejection| async move {
        if let Some(GraphQLBadRequest(err)) = err.find() {
            return Ok::<_, Infallible>(warp::reply::with_status(
                err.to_string(),
                StatusCode::BAD_REQUEST,
            ));
        }

        Ok(warp::reply::with_status(
            "INTERNAL_SERVER_ERROR".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    });

    tracing::info!("[API] Listening on: {}", listen);
    warp::serve(routes).run(listen).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::schema::SchemaBuilder;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_execute_within_timeout() {
        let storage = Arc::new(MemoryStorage::with_generated_chain(3, 1));
        let schema = SchemaBuilder::new(storage).with_core_queries().build().unwrap();
        let response = execute_with_timeout(
            schema.executor(),
            async_graphql::Request::new("{ chainHeight }"),
            Duration::from_secs(5),
        )
        .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
    }
}
