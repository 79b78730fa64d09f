use sqlx::error::ErrorKind;
use thiserror::Error;

// Failures surfaced by the persistence gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    #[error("Query error: {0}")]
    QueryError(String),
}

impl StoreError {
    /// Classifies a database-reported failure by its error kind (derived from
    /// the SQLSTATE code), never by message text.
    pub fn from_database_kind(kind: ErrorKind, constraint: Option<&str>, message: &str) -> Self {
        let constraint = constraint.unwrap_or("unnamed").to_string();
        match kind {
            ErrorKind::UniqueViolation => StoreError::UniqueViolation(constraint),
            ErrorKind::ForeignKeyViolation => StoreError::ForeignKeyViolation(constraint),
            ErrorKind::CheckViolation => StoreError::CheckViolation(constraint),
            _ => StoreError::QueryError(message.to_string()),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                StoreError::from_database_kind(db_err.kind(), db_err.constraint(), db_err.message())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::ConnectionError(err.to_string()),
            other => StoreError::QueryError(other.to_string()),
        }
    }
}

// Domain-level failures returned by the entity service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(constraint) => {
                ServiceError::Conflict(format!("record already exists ({})", constraint))
            }
            StoreError::ForeignKeyViolation(constraint) => {
                ServiceError::NotFound(format!("referenced user not found ({})", constraint))
            }
            StoreError::CheckViolation(constraint) => {
                ServiceError::InvalidInput(format!("value out of range ({})", constraint))
            }
            other @ (StoreError::ConnectionError(_) | StoreError::QueryError(_)) => {
                ServiceError::StorageError(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_kind_classification() {
        assert_eq!(
            StoreError::from_database_kind(ErrorKind::UniqueViolation, Some("users_email_key"), "dup"),
            StoreError::UniqueViolation("users_email_key".to_string())
        );
        assert_eq!(
            StoreError::from_database_kind(ErrorKind::ForeignKeyViolation, None, "fk"),
            StoreError::ForeignKeyViolation("unnamed".to_string())
        );
        assert_eq!(
            StoreError::from_database_kind(ErrorKind::CheckViolation, Some("month_range"), "check"),
            StoreError::CheckViolation("month_range".to_string())
        );
        assert_eq!(
            StoreError::from_database_kind(ErrorKind::NotNullViolation, Some("x"), "null value"),
            StoreError::QueryError("null value".to_string())
        );
    }

    #[test]
    fn test_pool_failures_are_connection_errors() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::ConnectionError(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::ConnectionError(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::QueryError(_)
        ));
    }

    #[test]
    fn test_store_to_service_mapping() {
        assert!(matches!(
            ServiceError::from(StoreError::UniqueViolation("k".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::ForeignKeyViolation("k".into())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::CheckViolation("k".into())),
            ServiceError::InvalidInput(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::ConnectionError("down".into())),
            ServiceError::StorageError(_)
        ));
        assert!(matches!(
            ServiceError::from(StoreError::QueryError("syntax".into())),
            ServiceError::StorageError(_)
        ));
    }
}
