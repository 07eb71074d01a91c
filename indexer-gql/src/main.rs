// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indexer_gql::defaults;
use indexer_gql::helpers::init_tracing;
use indexer_gql::schema::QueryGroup;
use indexer_gql::schema::SchemaBuilder;
use indexer_gql::storage::MemoryWatchlist;
use indexer_gql::storage::SqliteStorage;
use indexer_gql::web;
use indexer_gql::web::ServerConfig;

/// Block indexer GraphQL server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// SQLite database URL of the indexer store
    #[arg(short = 'd', long = "db", env, default_value = defaults::PATH_TO_DB)]
    db: String,

    /// The host address and TCP port on which the service will accept
    /// connections
    #[arg(short = 'l', long = "listen", env, default_value = defaults::LISTEN)]
    listen: SocketAddr,

    /// Per-request execution timeout, in seconds
    #[arg(long = "request-timeout", env, default_value_t = defaults::REQUEST_TIMEOUT)]
    request_timeout: u64,

    /// Query group to leave out of the schema (repeatable)
    #[arg(long = "disable", value_enum)]
    disable: Vec<QueryGroup>,

    /// Do not expose the watchlist query and mutations
    #[arg(long = "no-watchlist")]
    no_watchlist: bool,

    /// Print the schema SDL and exit
    #[arg(long = "print-schema")]
    print_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    let storage = Arc::new(SqliteStorage::open(&args.db).await?);
    let mut builder = QueryGroup::ALL
        .into_iter()
        .filter(|group| !args.disable.contains(group))
        .fold(SchemaBuilder::new(storage), |builder, group| builder.with_group(group));
    if !args.no_watchlist {
        builder = builder.with_watchlist(Arc::new(MemoryWatchlist::default()));
    }
    let schema = builder.build()?;

    if args.print_schema {
        println!("{}", schema.sdl());
        return Ok(());
    }

    let config = ServerConfig {
        listen: args.listen,
        request_timeout: Duration::from_secs(args.request_timeout),
    };
    web::start(config, schema).await
}
