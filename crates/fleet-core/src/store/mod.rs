//! Almacenamiento de workflows: contrato transaccional y backend en memoria.

mod memory;
mod types;

pub use memory::InMemoryWorkflowStore;
pub use types::{WorkflowStore, WorkflowTx};
