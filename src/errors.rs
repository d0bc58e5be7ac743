//! Errores de la aplicación (fachada).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Workflow(#[from] fleet_core::WorkflowError),
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Persistence(#[from] fleet_persistence::PersistenceError),
    #[error("DATABASE_URL no definido")]
    MissingDatabase,
}

impl AppError {
    /// Código de salida sugerido para binarios.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Workflow(e) => match fleet_core::classify_error(e) {
                fleet_core::ErrorClass::Actionable => 3,
                fleet_core::ErrorClass::StaleView => 4,
                fleet_core::ErrorClass::RetryLater => 5,
            },
            #[cfg(feature = "postgres")]
            Self::Persistence(_) => 5,
            Self::MissingDatabase => 4,
        }
    }
}
