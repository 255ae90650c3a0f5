use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Resource already exists: {0}")]
    Duplicate(String),

    #[error("Referenced resource not found: {0}")]
    Reference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Which bucket of the taxonomy a raw store failure code falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorClass {
    UniqueViolation,
    ForeignKeyViolation,
    Other,
}

/// Classifies a raw database error code.
///
/// Postgres SQLSTATE codes are recognised alongside SQLite's extended result
/// codes so the same mapping holds for either backend.
pub fn classify_code(code: &str) -> StoreErrorClass {
    match code {
        // unique_violation, SQLITE_CONSTRAINT_UNIQUE, SQLITE_CONSTRAINT_PRIMARYKEY
        "23505" | "2067" | "1555" => StoreErrorClass::UniqueViolation,
        // foreign_key_violation, SQLITE_CONSTRAINT_FOREIGNKEY
        "23503" | "787" => StoreErrorClass::ForeignKeyViolation,
        _ => StoreErrorClass::Other,
    }
}

impl CoreError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Duplicate(_) => "DUPLICATE_RESOURCE",
            CoreError::Reference(_) => "REFERENCE_ERROR",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Forbidden(_) => "FORBIDDEN",
            CoreError::InvalidInput(_) => "INVALID_INPUT",
            CoreError::Migration(_) | CoreError::Io(_) | CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-style status classification.
    pub fn status(&self) -> u16 {
        match self {
            CoreError::Duplicate(_) => 409,
            CoreError::Reference(_) | CoreError::NotFound(_) => 404,
            CoreError::Forbidden(_) => 403,
            CoreError::InvalidInput(_) => 400,
            CoreError::Migration(_) | CoreError::Io(_) | CoreError::Internal(_) => 500,
        }
    }

    /// Whether a workflow may turn this error into a spoken message instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::Duplicate(_) | CoreError::Reference(_))
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => CoreError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let class = match db_err.kind() {
                    ErrorKind::UniqueViolation => StoreErrorClass::UniqueViolation,
                    ErrorKind::ForeignKeyViolation => StoreErrorClass::ForeignKeyViolation,
                    _ => db_err
                        .code()
                        .map(|code| classify_code(&code))
                        .unwrap_or(StoreErrorClass::Other),
                };
                match class {
                    StoreErrorClass::UniqueViolation => {
                        CoreError::Duplicate("Resource already exists".to_string())
                    }
                    StoreErrorClass::ForeignKeyViolation => {
                        CoreError::Reference("Referenced resource not found".to_string())
                    }
                    StoreErrorClass::Other => {
                        tracing::error!(error = %db_err, code = ?db_err.code(), "unclassified database error");
                        CoreError::Internal(db_err.message().to_string())
                    }
                }
            }
            other => {
                tracing::error!(error = %other, "database error");
                CoreError::Internal(other.to_string())
            }
        }
    }
}
