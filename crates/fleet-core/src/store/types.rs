use chrono::{DateTime, Utc};
use fleet_domain::{AuditEntry, Step, Workflow, WorkflowStatus};
use uuid::Uuid;

use crate::audit::NewAuditEntry;
use crate::errors::{StoreError, WorkflowError};

/// Vista transaccional sobre un workflow bloqueado.
///
/// Contrato:
/// - `workflow()` refleja las escrituras ya hechas en esta transacción.
/// - Nada es visible fuera de la transacción hasta que el closure de
///   `WorkflowStore::transaction` devuelve `Ok`; un `Err` descarta todo.
pub trait WorkflowTx {
    fn workflow(&self) -> &Workflow;
    fn write_step(&mut self, step: &Step) -> Result<(), StoreError>;
    fn append_audit(&mut self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError>;
    fn write_aggregate(&mut self, status: WorkflowStatus, updated_at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Almacenamiento de workflows y sus etapas.
///
/// Las transacciones sobre un mismo workflow se serializan; sobre workflows
/// distintos son independientes.
pub trait WorkflowStore: Send + Sync {
    /// Devuelve el workflow del vehículo, creándolo (cuatro etapas pendientes)
    /// si no existe. Nunca crea dos workflows para el mismo vehículo.
    fn get_or_create(&self, vehicle_id: &str, now: DateTime<Utc>) -> Result<Workflow, StoreError>;

    fn load(&self, workflow_id: Uuid) -> Result<Option<Workflow>, StoreError>;

    fn find_by_vehicle(&self, vehicle_id: &str) -> Result<Option<Workflow>, StoreError>;

    /// Estado agregado de todos los workflows.
    fn aggregate_statuses(&self) -> Result<Vec<WorkflowStatus>, StoreError>;

    /// Ejecuta `work` de forma atómica sobre el workflow. Devuelve
    /// `WorkflowError::NotFound` si no existe. El backend puede reintentar
    /// `work` completo ante conflictos transitorios, por eso es `FnMut`.
    fn transaction<T, F>(&self, workflow_id: Uuid, work: F) -> Result<T, WorkflowError>
        where F: FnMut(&mut dyn WorkflowTx) -> Result<T, WorkflowError>;
}
