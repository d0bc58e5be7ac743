//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas del dominio de persistencia.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use fleet_core::StoreError;
use fleet_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found")]
    NotFound,
    #[error("serialization conflict (retryable)")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    /// Fila con valores que el dominio no reconoce.
    #[error("invalid row: {0}")]
    InvalidRow(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl PersistenceError {
    /// Errores transitorios: se recomienda reintentar la transacción completa.
    ///
    /// Algunos mensajes (dependen de driver/pg) llegan como `Unknown` con
    /// texto; se hace match best-effort sin acoplar a SQLSTATE.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SerializationConflict | Self::TransientIo(_) => true,
            Self::Unknown(msg) => {
                let m = msg.to_lowercase();
                m.contains("deadlock detected")
                || m.contains("could not serialize access due to concurrent update")
                || m.contains("terminating connection due to administrator command")
                || m.contains("connection closed")
                || m.contains("connection refused")
                || m.contains("timeout")
            }
            _ => false,
        }
    }
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::InvalidRow(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Unknown(format!("ser: {e}")),
            DieselError::RollbackErrorOnCommit { rollback_error,
                                                 commit_error, } => {
                Self::Unknown(format!("rollback={rollback_error}; commit={commit_error}"))
            }
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::QueryBuilderError(e) => Self::Unknown(format!("query builder: {e}")),
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

impl From<DomainError> for PersistenceError {
    fn from(err: DomainError) -> Self {
        Self::InvalidRow(err.to_string())
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::SerializationConflict => StoreError::Conflict("serialization conflict".into()),
            PersistenceError::TransientIo(msg) => StoreError::Unavailable(msg),
            other if other.is_retryable() => StoreError::Unavailable(other.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}
