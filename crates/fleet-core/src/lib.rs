//! fleet-core: workflow de habilitación de vehículos.
//!
//! - `aggregate`: regla pura cuatro etapas → estado del workflow.
//! - `store`: contrato transaccional del almacenamiento y backend en memoria.
//! - `audit`: historial append-only y su modelo de lectura.
//! - `engine`: máquina de estados, único mutador de las etapas.
//! - `view`: vistas por actor y señal de despacho.
pub mod aggregate;
pub mod audit;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod store;
pub mod view;

pub use aggregate::{aggregate, aggregate_steps, is_dispatchable};
pub use audit::{AuditHistory, AuditLog, NewAuditEntry};
pub use engine::{EngineBuilder, EngineConfig, ReadView, TransitionOutcome, TransitionRequest, WorkflowEngine};
pub use errors::{classify_error, ErrorClass, StoreError, WorkflowError};
pub use store::{InMemoryWorkflowStore, WorkflowStore, WorkflowTx};
pub use view::{Eligibility, StepView};

pub use fleet_policies::{RoleAuthority, StaticRoleAuthority};
