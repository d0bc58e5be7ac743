//! Vistas de lectura: etapas por actor y señal de despacho.
//!
//! Una etapa que el actor no puede modificar se muestra igual, en sólo
//! lectura, con el rol dueño y los roles del actor. La escritura sigue
//! controlada únicamente por el engine.
use chrono::{DateTime, Utc};
use fleet_domain::{Actor, AuditEntry, Role, RoleSet, StepKind, StepStatus, Workflow, WorkflowStatus};
use fleet_policies::RoleAuthority;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{aggregate_steps, is_dispatchable};
use crate::audit::AuditHistory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub kind: StepKind,
    pub status: StepStatus,
    pub comment: Option<String>,
    pub validator_name: Option<String>,
    pub validator_role: Option<Role>,
    pub validated_at: Option<DateTime<Utc>>,
    pub required_role: Role,
    pub actor_roles: RoleSet,
    pub editable: bool,
    /// Última entrada de auditoría de la etapa (comentario y autor en línea).
    pub last_entry: Option<AuditEntry>,
}

impl StepView {
    pub fn for_workflow(workflow: &Workflow,
                        history: &AuditHistory,
                        actor: &Actor,
                        authority: &dyn RoleAuthority)
                        -> Vec<StepView> {
        workflow.steps
                .iter()
                .map(|step| StepView { kind: step.kind,
                                       status: step.status,
                                       comment: step.comment.clone(),
                                       validator_name: step.validator_name.clone(),
                                       validator_role: step.validator_role,
                                       validated_at: step.validated_at,
                                       required_role: authority.required_role(step.kind),
                                       actor_roles: actor.roles.clone(),
                                       editable: authority.can_validate(&actor.roles, step.kind),
                                       last_entry: history.latest(step.kind).cloned() })
                .collect()
    }
}

/// ¿Puede el vehículo salir a misión?
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub vehicle_id: String,
    pub workflow_id: Uuid,
    pub aggregate_status: WorkflowStatus,
    pub dispatchable: bool,
    /// Etapas que aún no están validadas.
    pub blocking: Vec<StepKind>,
}

impl Eligibility {
    pub fn of(workflow: &Workflow) -> Self {
        let aggregate_status = aggregate_steps(&workflow.steps);
        let blocking = workflow.steps
                               .iter()
                               .filter(|s| s.status != StepStatus::Valide)
                               .map(|s| s.kind)
                               .collect();
        Self { vehicle_id: workflow.vehicle_id.clone(),
               workflow_id: workflow.id,
               aggregate_status,
               dispatchable: is_dispatchable(aggregate_status),
               blocking }
    }
}
