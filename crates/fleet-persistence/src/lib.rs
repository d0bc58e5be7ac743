//! fleet-persistence
//!
//! Backend PostgreSQL (Diesel + r2d2) de los contratos `WorkflowStore` y
//! `AuditLog` de `fleet-core`.
//!
//! Módulos:
//! - `pg`: store transaccional, pool de conexiones y reintentos.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::DbConfig;
pub use error::PersistenceError;
pub use pg::{build_pool, store_from_env, ConnectionProvider, PgPool, PgWorkflowStore, PoolProvider};
