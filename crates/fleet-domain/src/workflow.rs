//! Workflow de un vehículo: cuatro etapas fijas y un estado agregado.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::step::{Step, StepKind, STEP_COUNT};

/// Estado agregado. Siempre derivado de las etapas, nunca asignado por un
/// llamador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    EnValidation,
    Valide,
    Rejete,
}

impl WorkflowStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::EnValidation => "en_validation",
            WorkflowStatus::Valide => "valide",
            WorkflowStatus::Rejete => "rejete",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en_validation" => Ok(WorkflowStatus::EnValidation),
            "valide" => Ok(WorkflowStatus::Valide),
            "rejete" => Ok(WorkflowStatus::Rejete),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Workflow de habilitación de un vehículo.
///
/// Invariante: `steps[k.index()].kind == k` para las cuatro etapas. El arreglo
/// de tamaño fijo impide agregar o quitar etapas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub vehicle_id: String,
    pub aggregate_status: WorkflowStatus,
    pub steps: [Step; STEP_COUNT],
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    /// Workflow nuevo: cuatro etapas pendientes, agregado `en_validation`.
    pub fn new(id: Uuid, vehicle_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let steps = StepKind::ALL.map(|kind| Step::pending(id, kind));
        Self { id,
               vehicle_id: vehicle_id.into(),
               aggregate_status: WorkflowStatus::EnValidation,
               steps,
               created_at: now,
               updated_at: now }
    }

    /// Reconstruye un workflow desde filas almacenadas, validando que estén
    /// exactamente las cuatro etapas (sin duplicados, todas del mismo
    /// workflow).
    pub fn from_parts(id: Uuid,
                      vehicle_id: String,
                      aggregate_status: WorkflowStatus,
                      steps: Vec<Step>,
                      created_at: DateTime<Utc>,
                      updated_at: DateTime<Utc>)
                      -> Result<Self, DomainError> {
        if steps.len() != STEP_COUNT {
            return Err(DomainError::InvalidWorkflow(format!("workflow {id} tiene {} etapas", steps.len())));
        }
        let mut slots: [Option<Step>; STEP_COUNT] = Default::default();
        for step in steps {
            if step.workflow_id != id {
                return Err(DomainError::InvalidWorkflow(format!("etapa {} pertenece a {}", step.id, step.workflow_id)));
            }
            let idx = step.kind.index();
            if slots[idx].is_some() {
                return Err(DomainError::InvalidWorkflow(format!("etapa {} duplicada en {id}", step.kind)));
            }
            slots[idx] = Some(step);
        }
        let [m, a, h, o] = slots;
        match (m, a, h, o) {
            (Some(m), Some(a), Some(h), Some(o)) => Ok(Self { id,
                                                              vehicle_id,
                                                              aggregate_status,
                                                              steps: [m, a, h, o],
                                                              created_at,
                                                              updated_at }),
            _ => Err(DomainError::InvalidWorkflow(format!("workflow {id} sin todas las etapas"))),
        }
    }

    pub fn step(&self, kind: StepKind) -> &Step {
        &self.steps[kind.index()]
    }

    pub fn step_mut(&mut self, kind: StepKind) -> &mut Step {
        &mut self.steps[kind.index()]
    }
}

/// Conteo de workflows por estado agregado (tableros).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowStats {
    pub total: u64,
    pub en_validation: u64,
    pub valide: u64,
    pub rejete: u64,
}

impl WorkflowStats {
    pub fn record(&mut self, status: WorkflowStatus) {
        self.total += 1;
        match status {
            WorkflowStatus::EnValidation => self.en_validation += 1,
            WorkflowStatus::Valide => self.valide += 1,
            WorkflowStatus::Rejete => self.rejete += 1,
        }
    }
}

impl FromIterator<WorkflowStatus> for WorkflowStats {
    fn from_iter<T: IntoIterator<Item = WorkflowStatus>>(iter: T) -> Self {
        let mut stats = Self::default();
        for status in iter {
            stats.record(status);
        }
        stats
    }
}
