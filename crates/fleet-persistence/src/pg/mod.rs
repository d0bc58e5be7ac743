//! Implementación Postgres (Diesel) de los contratos de almacenamiento del
//! core.
//!
//! - `PgWorkflowStore`: `WorkflowStore` + `AuditLog` sobre tres tablas
//!   (`vehicle_workflows`, `workflow_steps`, `workflow_audit_log`).
//! - Cada transición corre en una sola transacción `read_write` que bloquea la
//!   fila del workflow (`SELECT ... FOR UPDATE`); las transiciones sobre un
//!   mismo workflow se serializan y las de workflows distintos no compiten.
//! - Reintento con backoff lineal ante errores transitorios. Cada intento es
//!   una transacción completa, así que un reintento nunca duplica una entrada
//!   de auditoría.

mod rows;
mod store;

use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use log::warn;

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;

pub use rows::{AuditRow, StepRow, WorkflowRow};
pub use store::PgWorkflowStore;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
///
/// Al construirlo se corre el set de migraciones pendientes (una sola vez).
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type PgPooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Contrato: devuelve una conexión válida o `PersistenceError::TransientIo`.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
#[derive(Clone)]
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Errores que saben si conviene repetir la unidad de trabajo.
pub(crate) trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for PersistenceError {
    fn is_transient(&self) -> bool {
        self.is_retryable()
    }
}

/// Repite `f` mientras falle con un error transitorio, hasta `attempts`
/// reintentos (backoff 15ms, 30ms, 45ms, ...). Emite `warn!` por intento.
pub(crate) fn with_retry<F, T, E>(attempts: u32, mut f: F) -> Result<T, E>
    where F: FnMut() -> Result<T, E>,
          E: Transient + std::fmt::Display
{
    let mut attempt = 0;
    loop {
        match f() {
            Err(e) if e.is_transient() && attempt < attempts => {
                let delay_ms = 15 * u64::from(attempt + 1);
                warn!("retryable storage error (attempt {}): {e} -> sleeping {delay_ms}ms", attempt + 1);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempt += 1;
            }
            r => return r,
        }
    }
}

/// Construye un pool Postgres r2d2 a partir de URL.
///
/// - Si `min_size > max_size`, usa `min_size = max_size`.
/// - Ejecuta migraciones con la primera conexión.
/// - Devuelve `PersistenceError::TransientIo` ante errores del pool/manager.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let validated_min = min_size.max(1);
    let validated_max = max_size.max(1);
    if validated_min > validated_max {
        warn!("min_size > max_size ({validated_min} > {validated_max}), ajustando min=max");
    }
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(validated_min.min(validated_max)))
                                    .max_size(validated_max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

pub fn build_pool_from_config(cfg: &DbConfig) -> Result<PgPool, PersistenceError> {
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}

/// Store listo para usar desde la configuración de entorno.
pub fn store_from_env() -> Result<PgWorkflowStore<PoolProvider>, PersistenceError> {
    let cfg = DbConfig::from_env()?;
    let pool = build_pool_from_config(&cfg)?;
    Ok(PgWorkflowStore::new(PoolProvider { pool }).with_retry_attempts(cfg.retry_attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn retry_stops_on_permanent_error() {
        let calls = Cell::new(0);
        let res: Result<(), PersistenceError> = with_retry(3, || {
            calls.set(calls.get() + 1);
            Err(PersistenceError::CheckViolation("x".into()))
        });
        assert!(res.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn retry_repeats_transient_error_then_succeeds() {
        let calls = Cell::new(0);
        let res = with_retry(3, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(PersistenceError::SerializationConflict)
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(res.unwrap(), 3);
    }

    #[test]
    fn retry_gives_up_after_budget() {
        let calls = Cell::new(0);
        let res: Result<(), PersistenceError> = with_retry(2, || {
            calls.set(calls.get() + 1);
            Err(PersistenceError::TransientIo("down".into()))
        });
        assert!(res.is_err());
        assert_eq!(calls.get(), 3);
    }
}
