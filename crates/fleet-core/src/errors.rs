//! Errores del core: fallo de almacenamiento y taxonomía de errores del
//! engine.
//!
//! Todos se devuelven de forma síncrona; el engine no reintenta ni oculta
//! ninguno.

use fleet_domain::{DomainError, Role, RoleSet, StepKind};
use thiserror::Error;
use uuid::Uuid;

/// Fallo reportado por un backend de almacenamiento.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    #[error("storage unavailable (retryable): {0}")]
    Unavailable(String),
    #[error("storage conflict (retryable): {0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Conflict(_))
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum WorkflowError {
    /// El workflow o la etapa no existe (vista probablemente desactualizada).
    #[error("not found: {0}")]
    NotFound(String),
    /// Los roles del actor no autorizan la etapa.
    #[error("forbidden: roles {actor_roles} cannot change step {step} (requires {required})")]
    Forbidden {
        step: StepKind,
        required: Role,
        actor_roles: RoleSet,
    },
    /// Petición mal formada.
    #[error("validation error on {field}: {message}")]
    Validation { field: String, message: String },
    /// Falló el almacenamiento; no hay efecto garantizado.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl WorkflowError {
    pub fn workflow_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("workflow {id}"))
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(),
                           message: message.into() }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UnknownStepKind(kind) => Self::NotFound(format!("step kind {kind}")),
            DomainError::UnknownStatus(status) => Self::validation("status", format!("unrecognized status {status}")),
            DomainError::UnknownRole(role) => Self::validation("roles", format!("unrecognized role {role}")),
            DomainError::InvalidWorkflow(msg) => Self::Storage(StoreError::Backend(msg)),
        }
    }
}

/// Clasificación de un error para la capa de presentación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Causado por el actor actual (permisos o datos); corregible por él.
    Actionable,
    /// La vista del llamador está desactualizada; refrescar.
    StaleView,
    /// Reintentar más tarde.
    RetryLater,
}

pub fn classify_error(err: &WorkflowError) -> ErrorClass {
    match err {
        WorkflowError::Forbidden { .. } | WorkflowError::Validation { .. } => ErrorClass::Actionable,
        WorkflowError::NotFound(_) => ErrorClass::StaleView,
        WorkflowError::Storage(_) => ErrorClass::RetryLater,
    }
}
