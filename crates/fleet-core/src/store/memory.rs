//! Backend en memoria (tests, demo y prototipos).
//!
//! Cada workflow vive detrás de su propio `Mutex`: las transacciones sobre el
//! mismo workflow se serializan y las de workflows distintos no se tocan. La
//! transacción trabaja sobre una copia y sólo la publica al terminar con
//! `Ok`, lo que da atomicidad sin rollback explícito.
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use fleet_domain::{AuditEntry, Step, Workflow, WorkflowStatus};
use log::debug;
use uuid::Uuid;

use super::types::{WorkflowStore, WorkflowTx};
use crate::audit::{AuditLog, NewAuditEntry};
use crate::errors::{StoreError, WorkflowError};

struct Slot {
    workflow: Workflow,
    audit: Vec<AuditEntry>,
}

#[derive(Default)]
pub struct InMemoryWorkflowStore {
    by_vehicle: DashMap<String, Uuid>,
    workflows: DashMap<Uuid, Arc<Mutex<Slot>>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    fn slot(&self, workflow_id: Uuid) -> Option<Arc<Mutex<Slot>>> {
        self.workflows.get(&workflow_id).map(|r| Arc::clone(r.value()))
    }
}

fn lock(slot: &Mutex<Slot>) -> Result<MutexGuard<'_, Slot>, StoreError> {
    slot.lock().map_err(|_| StoreError::Backend("workflow lock poisoned".into()))
}

impl WorkflowStore for InMemoryWorkflowStore {
    fn get_or_create(&self, vehicle_id: &str, now: DateTime<Utc>) -> Result<Workflow, StoreError> {
        let workflow_id = match self.by_vehicle.entry(vehicle_id.to_string()) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(v) => {
                let workflow = Workflow::new(Uuid::new_v4(), vehicle_id, now);
                debug!("get_or_create: new workflow={} vehicle={vehicle_id}", workflow.id);
                let created = workflow.clone();
                self.workflows.insert(workflow.id,
                                      Arc::new(Mutex::new(Slot { workflow, audit: Vec::new() })));
                v.insert(created.id);
                return Ok(created);
            }
        };
        self.load(workflow_id)?
            .ok_or_else(|| StoreError::Backend(format!("vehicle index points to missing workflow {workflow_id}")))
    }

    fn load(&self, workflow_id: Uuid) -> Result<Option<Workflow>, StoreError> {
        match self.slot(workflow_id) {
            Some(slot) => Ok(Some(lock(&slot)?.workflow.clone())),
            None => Ok(None),
        }
    }

    fn find_by_vehicle(&self, vehicle_id: &str) -> Result<Option<Workflow>, StoreError> {
        let id = self.by_vehicle.get(vehicle_id).map(|r| *r.value());
        match id {
            Some(id) => self.load(id),
            None => Ok(None),
        }
    }

    fn aggregate_statuses(&self) -> Result<Vec<WorkflowStatus>, StoreError> {
        let slots: Vec<Arc<Mutex<Slot>>> = self.workflows.iter().map(|r| Arc::clone(r.value())).collect();
        slots.iter()
             .map(|s| -> Result<WorkflowStatus, StoreError> { Ok(lock(s)?.workflow.aggregate_status) })
             .collect()
    }

    fn transaction<T, F>(&self, workflow_id: Uuid, mut work: F) -> Result<T, WorkflowError>
        where F: FnMut(&mut dyn WorkflowTx) -> Result<T, WorkflowError>
    {
        let slot = self.slot(workflow_id)
                       .ok_or_else(|| WorkflowError::workflow_not_found(workflow_id))?;
        let mut guard = lock(&slot)?;
        let mut tx = MemoryTx { workflow: guard.workflow.clone(),
                                staged: Vec::new(),
                                next_seq: guard.audit.len() as u64 };
        let out = work(&mut tx)?;
        debug!("transaction:commit workflow={workflow_id} audit_entries={}", tx.staged.len());
        guard.workflow = tx.workflow;
        guard.audit.extend(tx.staged);
        Ok(out)
    }
}

impl AuditLog for InMemoryWorkflowStore {
    fn list(&self, workflow_id: Uuid) -> Result<Vec<AuditEntry>, StoreError> {
        match self.slot(workflow_id) {
            Some(slot) => Ok(lock(&slot)?.audit.clone()),
            None => Ok(Vec::new()),
        }
    }
}

struct MemoryTx {
    workflow: Workflow,
    staged: Vec<AuditEntry>,
    next_seq: u64,
}

impl WorkflowTx for MemoryTx {
    fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    fn write_step(&mut self, step: &Step) -> Result<(), StoreError> {
        if step.workflow_id != self.workflow.id {
            return Err(StoreError::Backend(format!("step {} does not belong to workflow {}",
                                                   step.id, self.workflow.id)));
        }
        *self.workflow.step_mut(step.kind) = step.clone();
        Ok(())
    }

    fn append_audit(&mut self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError> {
        let entry = entry.into_entry(Uuid::new_v4(), self.next_seq);
        self.next_seq += 1;
        self.staged.push(entry.clone());
        Ok(entry)
    }

    fn write_aggregate(&mut self, status: WorkflowStatus, updated_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.workflow.aggregate_status = status;
        self.workflow.updated_at = updated_at;
        Ok(())
    }
}
