//! Entrada del historial de auditoría.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::Role;
use crate::step::{StepKind, StepStatus};

/// Registro inmutable de una transición exitosa.
///
/// `seq` lo asigna el almacenamiento en orden de inserción y desempata
/// entradas con el mismo `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub seq: u64,
    pub workflow_id: Uuid,
    pub step_kind: StepKind,
    pub previous_status: StepStatus,
    pub new_status: StepStatus,
    pub comment: String,
    pub actor_name: String,
    pub actor_role: Role,
    pub created_at: DateTime<Utc>,
}
