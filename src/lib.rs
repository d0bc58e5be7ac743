//! FleetFlow Rust Library
//!
//! Fachada del workflow de habilitación de vehículos:
//! - Reexporta los tipos de dominio, la autoridad de roles y el engine.
//! - Expone `config` (configuración de la aplicación) y `errors`.
//! - Con el feature `postgres`, expone el backend Diesel como `persistence`.

pub mod config;
pub mod errors;

pub use fleet_core::{aggregate,
                     aggregate_steps,
                     classify_error,
                     is_dispatchable,
                     AuditHistory,
                     Eligibility,
                     EngineConfig,
                     ErrorClass,
                     InMemoryWorkflowStore,
                     ReadView,
                     StepView,
                     StoreError,
                     TransitionOutcome,
                     TransitionRequest,
                     WorkflowEngine,
                     WorkflowError};
pub use fleet_domain::{Actor, AuditEntry, Role, RoleSet, Step, StepKind, StepStatus, Workflow, WorkflowStats,
                       WorkflowStatus};
pub use fleet_policies::{RoleAuthority, StaticRoleAuthority};

#[cfg(feature = "postgres")]
pub use fleet_persistence as persistence;

pub use config::AppConfig;
pub use errors::AppError;

/// Engine sobre el backend en memoria con la configuración dada.
pub fn in_memory_engine(config: &AppConfig) -> WorkflowEngine<InMemoryWorkflowStore> {
    WorkflowEngine::builder(InMemoryWorkflowStore::new()).config(config.engine)
                                                         .build()
}

/// Engine sobre Postgres; requiere `database` en la configuración.
#[cfg(feature = "postgres")]
pub fn postgres_engine(config: &AppConfig)
                       -> Result<WorkflowEngine<persistence::PgWorkflowStore<persistence::PoolProvider>>, AppError> {
    let db = config.database.as_ref().ok_or(AppError::MissingDatabase)?;
    let pool = persistence::pg::build_pool_from_config(db)?;
    let store = persistence::PgWorkflowStore::new(persistence::PoolProvider { pool }).with_retry_attempts(db.retry_attempts);
    Ok(WorkflowEngine::builder(store).config(config.engine).build())
}
