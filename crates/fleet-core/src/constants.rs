//! Constantes del engine de habilitación.

/// Mensaje de validación cuando se rechaza una etapa sin comentario.
pub const COMMENT_REQUIRED_FOR_REJECTION: &str = "comment required for rejection";

/// Variable de entorno que controla la auditoría de transiciones sin cambio.
pub const ENV_AUDIT_UNCHANGED_TRANSITIONS: &str = "FLEET_AUDIT_UNCHANGED_TRANSITIONS";
