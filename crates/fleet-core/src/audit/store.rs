use chrono::{DateTime, Utc};
use fleet_domain::{AuditEntry, Role, StepKind, StepStatus};
use uuid::Uuid;

use crate::errors::StoreError;

/// Entrada aún no persistida; el backend asigna `id` y `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub workflow_id: Uuid,
    pub step_kind: StepKind,
    pub previous_status: StepStatus,
    pub new_status: StepStatus,
    pub comment: String,
    pub actor_name: String,
    pub actor_role: Role,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    pub fn into_entry(self, id: Uuid, seq: u64) -> AuditEntry {
        AuditEntry { id,
                     seq,
                     workflow_id: self.workflow_id,
                     step_kind: self.step_kind,
                     previous_status: self.previous_status,
                     new_status: self.new_status,
                     comment: self.comment,
                     actor_name: self.actor_name,
                     actor_role: self.actor_role,
                     created_at: self.created_at }
    }
}

/// Lectura del historial. Las escrituras sólo ocurren dentro de
/// `WorkflowTx::append_audit`; ninguna entrada se modifica ni se borra.
pub trait AuditLog: Send + Sync {
    /// Entradas de un workflow en orden cronológico (`created_at`, luego
    /// `seq`).
    fn list(&self, workflow_id: Uuid) -> Result<Vec<AuditEntry>, StoreError>;

    fn list_for_step(&self, workflow_id: Uuid, kind: StepKind) -> Result<Vec<AuditEntry>, StoreError> {
        Ok(self.list(workflow_id)?.into_iter().filter(|e| e.step_kind == kind).collect())
    }
}
