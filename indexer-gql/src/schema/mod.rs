// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

//! Dynamic GraphQL surface assembled from optional query groups.

pub mod args;
pub mod builder;
pub mod capability;
pub mod connection;
pub mod error;
mod groups;
pub mod types;
pub mod wire;

pub use builder::IndexerSchema;
pub use builder::QueryGroup;
pub use builder::SchemaBuilder;
pub use connection::Connection;
pub use connection::PageInfo;
pub use error::BuildError;
pub use error::QueryError;
