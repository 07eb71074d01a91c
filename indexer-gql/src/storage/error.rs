// 2022-2026 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The record is legitimately absent. Resolvers turn this into `null`.
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Query execution error: {0}")]
    Query(String),

    #[error("Corrupted record: {0}")]
    Corrupted(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound("row".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::Connection(err.to_string())
            }
            err => StorageError::Query(err.to_string()),
        }
    }
}

pub trait NotFoundExt<T> {
    /// Separates "absent" from failure: `NotFound` becomes `Ok(None)`.
    fn found(self) -> StorageResult<Option<T>>;
}

impl<T> NotFoundExt<T> for StorageResult<T> {
    fn found(self) -> StorageResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::NotFound(what)) => {
                tracing::trace!("not found: {what}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_found_separates_absence_from_failure() {
        let absent: StorageResult<u64> = Err(StorageError::NotFound("block 7".into()));
        assert!(matches!(absent.found(), Ok(None)));

        let present: StorageResult<u64> = Ok(7);
        assert!(matches!(present.found(), Ok(Some(7))));

        let broken: StorageResult<u64> = Err(StorageError::Query("disk I/O error".into()));
        assert!(matches!(broken.found(), Err(StorageError::Query(_))));
    }

    #[test]
    fn test_sqlx_row_not_found_is_not_found() {
        let err: StorageError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
