use std::fmt;

use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use fleet_core::{AuditLog, NewAuditEntry, StoreError, WorkflowError, WorkflowStore, WorkflowTx};
use fleet_domain::{AuditEntry, Step, StepKind, Workflow, WorkflowStatus};
use log::{debug, error};
use uuid::Uuid;

use super::rows::{self, AuditRow, NewAuditRow, NewWorkflowRow, StepChanges, StepRow, WorkflowRow};
use super::{with_retry, ConnectionProvider, Transient};
use crate::config::DEFAULT_RETRY_ATTEMPTS;
use crate::error::PersistenceError;
use crate::schema::{vehicle_workflows, workflow_audit_log, workflow_steps};

/// Implementación Postgres de `WorkflowStore` y `AuditLog`.
pub struct PgWorkflowStore<P: ConnectionProvider> {
    pub provider: P,
    retry_attempts: u32,
}

impl<P: ConnectionProvider> PgWorkflowStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider,
               retry_attempts: DEFAULT_RETRY_ATTEMPTS }
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    fn read<T, F>(&self, op: &str, mut f: F) -> Result<T, StoreError>
        where F: FnMut(&mut PgConnection) -> Result<T, PersistenceError>
    {
        with_retry(self.retry_attempts, || {
            let mut conn = self.provider.connection()?;
            f(&mut *conn)
        }).map_err(|e| {
              error!("{op}: {e}");
              StoreError::from(e)
          })
    }
}

fn load_workflow(conn: &mut PgConnection, workflow_id: Uuid) -> Result<Option<Workflow>, PersistenceError> {
    let Some(row) = vehicle_workflows::table.find(workflow_id)
                                            .first::<WorkflowRow>(conn)
                                            .optional()?
    else {
        return Ok(None);
    };
    let steps = load_steps(conn, workflow_id)?;
    rows::workflow_from_rows(row, steps).map(Some)
}

fn load_steps(conn: &mut PgConnection, workflow_id: Uuid) -> Result<Vec<StepRow>, PersistenceError> {
    Ok(workflow_steps::table.filter(workflow_steps::workflow_id.eq(workflow_id))
                            .load::<StepRow>(conn)?)
}

fn load_audit(conn: &mut PgConnection,
              workflow_id: Uuid,
              kind: Option<StepKind>)
              -> Result<Vec<AuditEntry>, PersistenceError> {
    let mut query: workflow_audit_log::BoxedQuery<'_, Pg> = workflow_audit_log::table.filter(workflow_audit_log::workflow_id.eq(workflow_id))
                                             .order((workflow_audit_log::created_at.asc(), workflow_audit_log::seq.asc()))
                                             .into_boxed();
    if let Some(kind) = kind {
        query = query.filter(workflow_audit_log::step_kind.eq(kind.as_str()));
    }
    query.load::<AuditRow>(conn)?
         .into_iter()
         .map(AuditRow::into_entry)
         .collect()
}

impl<P: ConnectionProvider> WorkflowStore for PgWorkflowStore<P> {
    fn get_or_create(&self, vehicle_id: &str, now: DateTime<Utc>) -> Result<Workflow, StoreError> {
        self.read("get_or_create", |conn| {
                conn.build_transaction().read_write().run(|tx_conn| {
                    let fresh = Workflow::new(Uuid::new_v4(), vehicle_id, now);
                    // Dos llamadas concurrentes: la segunda espera el índice
                    // único y no inserta nada.
                    let inserted = diesel::insert_into(vehicle_workflows::table)
                        .values(NewWorkflowRow { id: fresh.id,
                                                 vehicle_id,
                                                 aggregate_status: fresh.aggregate_status.as_str(),
                                                 created_at: now,
                                                 updated_at: now })
                        .on_conflict(vehicle_workflows::vehicle_id)
                        .do_nothing()
                        .execute(tx_conn)?;
                    if inserted == 1 {
                        let steps: Vec<StepRow> = fresh.steps.iter().map(StepRow::from_step).collect();
                        diesel::insert_into(workflow_steps::table).values(&steps)
                                                                  .execute(tx_conn)?;
                        debug!("get_or_create: new workflow={} vehicle={vehicle_id}", fresh.id);
                    }
                    let id: Uuid = vehicle_workflows::table.filter(vehicle_workflows::vehicle_id.eq(vehicle_id))
                                                           .select(vehicle_workflows::id)
                                                           .first(tx_conn)?;
                    load_workflow(tx_conn, id)?.ok_or(PersistenceError::NotFound)
                })
            })
    }

    fn load(&self, workflow_id: Uuid) -> Result<Option<Workflow>, StoreError> {
        self.read("load", |conn| load_workflow(conn, workflow_id))
    }

    fn find_by_vehicle(&self, vehicle_id: &str) -> Result<Option<Workflow>, StoreError> {
        self.read("find_by_vehicle", |conn| {
                let id: Option<Uuid> = vehicle_workflows::table.filter(vehicle_workflows::vehicle_id.eq(vehicle_id))
                                                               .select(vehicle_workflows::id)
                                                               .first(conn)
                                                               .optional()?;
                match id {
                    Some(id) => load_workflow(conn, id),
                    None => Ok(None),
                }
            })
    }

    fn aggregate_statuses(&self) -> Result<Vec<WorkflowStatus>, StoreError> {
        self.read("aggregate_statuses", |conn| {
                vehicle_workflows::table.select(vehicle_workflows::aggregate_status)
                                        .load::<String>(conn)?
                                        .iter()
                                        .map(|raw| rows::parse_aggregate(raw))
                                        .collect()
            })
    }

    fn transaction<T, F>(&self, workflow_id: Uuid, mut work: F) -> Result<T, WorkflowError>
        where F: FnMut(&mut dyn WorkflowTx) -> Result<T, WorkflowError>
    {
        let result = with_retry(self.retry_attempts, || {
            let mut conn = self.provider.connection()?;
            conn.build_transaction().read_write().run(|tx_conn| {
                // Bloquea la fila: serializa transiciones del mismo workflow.
                let locked = vehicle_workflows::table.find(workflow_id)
                                                     .for_update()
                                                     .first::<WorkflowRow>(tx_conn)
                                                     .optional()?;
                let Some(row) = locked else {
                    return Err(TxFailure::Workflow(WorkflowError::workflow_not_found(workflow_id)));
                };
                let steps = load_steps(tx_conn, workflow_id)?;
                let workflow = rows::workflow_from_rows(row, steps)?;
                let mut tx = PgTx { conn: tx_conn,
                                    workflow };
                work(&mut tx).map_err(TxFailure::Workflow)
            })
        });
        result.map_err(|failure| match failure {
                  TxFailure::Workflow(e) => e,
                  TxFailure::Db(e) => {
                      error!("transaction: workflow={workflow_id} err={e}");
                      WorkflowError::Storage(e.into())
                  }
              })
    }
}

impl<P: ConnectionProvider> AuditLog for PgWorkflowStore<P> {
    fn list(&self, workflow_id: Uuid) -> Result<Vec<AuditEntry>, StoreError> {
        self.read("audit:list", |conn| load_audit(conn, workflow_id, None))
    }

    fn list_for_step(&self, workflow_id: Uuid, kind: StepKind) -> Result<Vec<AuditEntry>, StoreError> {
        self.read("audit:list_for_step", |conn| load_audit(conn, workflow_id, Some(kind)))
    }
}

/// Resultado fallido de una transacción: error de base (reintentable o no) o
/// rechazo del engine (nunca se reintenta salvo que venga de un fallo
/// transitorio del propio store).
#[derive(Debug)]
enum TxFailure {
    Db(PersistenceError),
    Workflow(WorkflowError),
}

impl From<diesel::result::Error> for TxFailure {
    fn from(err: diesel::result::Error) -> Self {
        Self::Db(err.into())
    }
}

impl From<PersistenceError> for TxFailure {
    fn from(err: PersistenceError) -> Self {
        Self::Db(err)
    }
}

impl fmt::Display for TxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Db(e) => e.fmt(f),
            Self::Workflow(e) => e.fmt(f),
        }
    }
}

impl Transient for TxFailure {
    fn is_transient(&self) -> bool {
        match self {
            Self::Db(e) => e.is_retryable(),
            Self::Workflow(WorkflowError::Storage(e)) => e.is_retryable(),
            Self::Workflow(_) => false,
        }
    }
}

struct PgTx<'c> {
    conn: &'c mut PgConnection,
    workflow: Workflow,
}

fn store_err(err: diesel::result::Error) -> StoreError {
    PersistenceError::from(err).into()
}

impl WorkflowTx for PgTx<'_> {
    fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    fn write_step(&mut self, step: &Step) -> Result<(), StoreError> {
        let updated = diesel::update(workflow_steps::table.filter(workflow_steps::workflow_id.eq(self.workflow.id))
                                                          .filter(workflow_steps::kind.eq(step.kind.as_str())))
            .set(StepChanges::from_step(step))
            .execute(&mut *self.conn)
            .map_err(store_err)?;
        if updated != 1 {
            return Err(StoreError::Backend(format!("step {} of workflow {} updated {updated} rows",
                                                   step.kind, self.workflow.id)));
        }
        *self.workflow.step_mut(step.kind) = step.clone();
        Ok(())
    }

    fn append_audit(&mut self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError> {
        let id = Uuid::new_v4();
        let seq: i64 = diesel::insert_into(workflow_audit_log::table).values(NewAuditRow::from_entry(id, &entry))
                                                                     .returning(workflow_audit_log::seq)
                                                                     .get_result(&mut *self.conn)
                                                                     .map_err(store_err)?;
        let seq = u64::try_from(seq).map_err(|_| StoreError::Backend(format!("negative audit seq {seq}")))?;
        Ok(entry.into_entry(id, seq))
    }

    fn write_aggregate(&mut self, status: WorkflowStatus, updated_at: DateTime<Utc>) -> Result<(), StoreError> {
        diesel::update(vehicle_workflows::table.find(self.workflow.id))
            .set((vehicle_workflows::aggregate_status.eq(status.as_str()),
                  vehicle_workflows::updated_at.eq(updated_at)))
            .execute(&mut *self.conn)
            .map_err(store_err)?;
        self.workflow.aggregate_status = status;
        self.workflow.updated_at = updated_at;
        Ok(())
    }
}
