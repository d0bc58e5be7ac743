//! Etapas del workflow y su estado.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::role::Role;

/// Cantidad fija de etapas por workflow.
pub const STEP_COUNT: usize = 4;

/// Las cuatro etapas de habilitación. El orden de declaración es el orden de
/// presentación y el índice dentro de `Workflow::steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Maintenance,
    Administrative,
    Hseq,
    Operations,
}

impl StepKind {
    pub const ALL: [StepKind; STEP_COUNT] = [StepKind::Maintenance,
                                             StepKind::Administrative,
                                             StepKind::Hseq,
                                             StepKind::Operations];

    pub const fn index(self) -> usize {
        match self {
            StepKind::Maintenance => 0,
            StepKind::Administrative => 1,
            StepKind::Hseq => 2,
            StepKind::Operations => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            StepKind::Maintenance => "maintenance",
            StepKind::Administrative => "administrative",
            StepKind::Hseq => "hseq",
            StepKind::Operations => "operations",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "maintenance" => Ok(StepKind::Maintenance),
            "administrative" | "administratif" => Ok(StepKind::Administrative),
            "hseq" => Ok(StepKind::Hseq),
            "operations" | "exploitation" => Ok(StepKind::Operations),
            other => Err(DomainError::UnknownStepKind(other.to_string())),
        }
    }
}

/// Estado de una etapa.
///
/// No hay estado terminal: cualquier estado es alcanzable desde cualquier
/// otro (una validación puede reabrirse o pasar a rechazo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Pendiente de revisión.
    #[default]
    EnAttente,
    /// Aprobada.
    Valide,
    /// Rechazada; siempre acompañada de un comentario.
    Rejete,
}

impl StepStatus {
    pub const ALL: [StepStatus; 3] = [StepStatus::EnAttente, StepStatus::Valide, StepStatus::Rejete];

    pub const fn as_str(self) -> &'static str {
        match self {
            StepStatus::EnAttente => "en_attente",
            StepStatus::Valide => "valide",
            StepStatus::Rejete => "rejete",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en_attente" | "pending" => Ok(StepStatus::EnAttente),
            "valide" | "approved" => Ok(StepStatus::Valide),
            "rejete" | "rejected" => Ok(StepStatus::Rejete),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Estado persistido de una etapa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub kind: StepKind,
    pub status: StepStatus,
    pub comment: Option<String>,
    pub validator_name: Option<String>,
    pub validator_role: Option<Role>,
    pub validated_at: Option<DateTime<Utc>>,
}

impl Step {
    /// Etapa recién creada: pendiente y sin validador.
    pub fn pending(workflow_id: Uuid, kind: StepKind) -> Self {
        Self { id: Uuid::new_v4(),
               workflow_id,
               kind,
               status: StepStatus::EnAttente,
               comment: None,
               validator_name: None,
               validator_role: None,
               validated_at: None }
    }
}
