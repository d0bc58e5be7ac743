//! Configuración del engine.
use serde::{Deserialize, Serialize};

use crate::constants::ENV_AUDIT_UNCHANGED_TRANSITIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Si es `true` (por defecto), volver a enviar el estado actual con el
    /// mismo comentario igual escribe la etapa y agrega una entrada de
    /// auditoría ("reconfirmado"). Si es `false`, esa petición no escribe
    /// nada.
    pub audit_unchanged_transitions: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { audit_unchanged_transitions: true }
    }
}

impl EngineConfig {
    /// Variante que omite las transiciones sin cambio.
    pub fn skip_unchanged() -> Self {
        Self { audit_unchanged_transitions: false }
    }

    /// Lee `FLEET_AUDIT_UNCHANGED_TRANSITIONS`; valores no reconocidos
    /// mantienen el valor por defecto.
    pub fn from_env() -> Self {
        let default = Self::default();
        let audit_unchanged_transitions = std::env::var(ENV_AUDIT_UNCHANGED_TRANSITIONS).ok()
                                                                                     .and_then(|v| parse_flag(&v))
                                                                                     .unwrap_or(default.audit_unchanged_transitions);
        Self { audit_unchanged_transitions }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
