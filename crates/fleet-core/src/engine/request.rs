use fleet_domain::{Actor, AuditEntry, Step, StepKind, StepStatus, WorkflowStatus};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::WorkflowError;

/// Petición de transición de una etapa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub workflow_id: Uuid,
    pub step: StepKind,
    pub actor: Actor,
    pub target: StepStatus,
    pub comment: Option<String>,
}

impl TransitionRequest {
    pub fn new(workflow_id: Uuid, step: StepKind, actor: Actor, target: StepStatus) -> Self {
        Self { workflow_id,
               step,
               actor,
               target,
               comment: None }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Construye la petición desde texto (CLI, formularios). Una etapa
    /// desconocida es `NotFound`; un estado desconocido es `Validation`.
    pub fn parse(workflow_id: Uuid,
                 step: &str,
                 actor: Actor,
                 target: &str,
                 comment: Option<String>)
                 -> Result<Self, WorkflowError> {
        let step: StepKind = step.parse()?;
        let target: StepStatus = target.parse()?;
        Ok(Self { workflow_id,
                  step,
                  actor,
                  target,
                  comment })
    }
}

/// Resultado de una transición aplicada (o descartada por no tener cambios).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub workflow_id: Uuid,
    pub vehicle_id: String,
    pub step: Step,
    pub previous_status: StepStatus,
    pub aggregate_status: WorkflowStatus,
    /// `None` sólo cuando la transición no tenía cambios y la configuración
    /// pide omitirlas.
    pub audit_entry: Option<AuditEntry>,
}

/// Vistas de lectura que el llamador debe refrescar tras una transición.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "view", content = "key", rename_all = "snake_case")]
pub enum ReadView {
    WorkflowSteps(Uuid),
    History(Uuid),
    VehicleEligibility(String),
    VehicleList,
}

impl TransitionOutcome {
    pub fn changed(&self) -> bool {
        self.audit_entry.is_some()
    }

    pub fn invalidations(&self) -> Vec<ReadView> {
        if !self.changed() {
            return Vec::new();
        }
        vec![ReadView::WorkflowSteps(self.workflow_id),
             ReadView::History(self.workflow_id),
             ReadView::VehicleEligibility(self.vehicle_id.clone()),
             ReadView::VehicleList]
    }
}
