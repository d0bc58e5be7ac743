//! fleet-domain: tipos de valor del workflow de habilitación de vehículos.
//!
//! Un vehículo sólo puede salir a misión cuando sus cuatro etapas
//! (mantenimiento, administrativa, HSEQ, operaciones) están validadas. Este
//! crate sólo define la forma de los datos; las reglas viven en
//! `fleet-policies` y `fleet-core`.
pub mod audit;
pub mod error;
pub mod role;
pub mod step;
pub mod workflow;

pub use audit::AuditEntry;
pub use error::DomainError;
pub use role::{Actor, Role, RoleSet};
pub use step::{Step, StepKind, StepStatus, STEP_COUNT};
pub use workflow::{Workflow, WorkflowStats, WorkflowStatus};
