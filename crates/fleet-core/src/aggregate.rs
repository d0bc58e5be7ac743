//! Regla de agregación: cuatro estados de etapa → estado del workflow.
//!
//! Precedencia (gana la primera):
//! 1. alguna etapa `rejete` → `rejete`
//! 2. las cuatro `valide` → `valide`
//! 3. resto → `en_validation`

use fleet_domain::{Step, StepStatus, WorkflowStatus, STEP_COUNT};

pub fn aggregate(statuses: [StepStatus; STEP_COUNT]) -> WorkflowStatus {
    if statuses.contains(&StepStatus::Rejete) {
        WorkflowStatus::Rejete
    } else if statuses.iter().all(|s| *s == StepStatus::Valide) {
        WorkflowStatus::Valide
    } else {
        WorkflowStatus::EnValidation
    }
}

pub fn aggregate_steps(steps: &[Step; STEP_COUNT]) -> WorkflowStatus {
    aggregate(steps.each_ref().map(|s| s.status))
}

/// Un vehículo puede despacharse sólo con el workflow validado.
pub fn is_dispatchable(status: WorkflowStatus) -> bool {
    status == WorkflowStatus::Valide
}
