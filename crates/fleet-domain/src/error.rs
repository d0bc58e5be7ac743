use thiserror::Error;

/// Errores de construcción/parsing de los tipos de dominio.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("tipo de etapa desconocido: {0}")]
    UnknownStepKind(String),

    #[error("estado desconocido: {0}")]
    UnknownStatus(String),

    #[error("rol desconocido: {0}")]
    UnknownRole(String),

    #[error("workflow inconsistente: {0}")]
    InvalidWorkflow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_step_kind_format() {
        let err = DomainError::UnknownStepKind("billing".into());
        assert_eq!(err.to_string(), "tipo de etapa desconocido: billing");
    }

    #[test]
    fn test_invalid_workflow_format() {
        let err = DomainError::InvalidWorkflow("3 etapas".into());
        assert_eq!(err.to_string(), "workflow inconsistente: 3 etapas");
    }
}
