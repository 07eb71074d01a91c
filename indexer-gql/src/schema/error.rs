// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::fmt::Display;

use async_graphql::Error;
use async_graphql::ErrorExtensions;
use thiserror::Error;

use crate::storage::Capability;
use crate::storage::StorageError;

/// Request-time failure of a single field.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("{0} is not supported by this storage backend")]
    Unsupported(Capability),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to encode {type_name}: {reason}")]
    Encode { type_name: &'static str, reason: String },
}

impl QueryError {
    pub fn invalid(name: &'static str, reason: impl Display) -> Self {
        QueryError::InvalidArgument { name, reason: reason.to_string() }
    }

    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidArgument { .. } => "BAD_USER_INPUT",
            QueryError::Unsupported(_) => "NOT_SUPPORTED",
            QueryError::Storage(_) | QueryError::Encode { .. } => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ErrorExtensions for QueryError {
    fn extend(&self) -> Error {
        let code = self.code();
        Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

/// Startup failure assembling the schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("schema has no query fields")]
    NoQueryFields,

    #[error("field `{field}` returns unregistered type `{type_name}`")]
    UnknownType { field: String, type_name: String },

    #[error("GraphQL engine rejected the schema: {0}")]
    Engine(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let invalid = QueryError::invalid("limit", "must be between 1 and 1000");
        assert_eq!(invalid.code(), "BAD_USER_INPUT");
        assert_eq!(invalid.to_string(), "Invalid argument `limit`: must be between 1 and 1000");

        let unsupported = QueryError::Unsupported(Capability::TokenHolders);
        assert_eq!(unsupported.code(), "NOT_SUPPORTED");
        assert_eq!(
            unsupported.to_string(),
            "token holder indexing is not supported by this storage backend"
        );

        let storage = QueryError::from(StorageError::Connection("pool closed".into()));
        assert_eq!(storage.code(), "INTERNAL_SERVER_ERROR");
    }
}
