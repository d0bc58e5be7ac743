//! Un fallo de almacenamiento a mitad de transición no deja efectos.
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use fleet_core::{AuditLog, ErrorClass, InMemoryWorkflowStore, NewAuditEntry, StoreError, TransitionRequest,
                 WorkflowEngine, WorkflowError, WorkflowStore, WorkflowTx, classify_error};
use fleet_domain::{Actor, AuditEntry, Role, Step, StepKind, StepStatus, Workflow, WorkflowStatus};
use uuid::Uuid;

#[derive(Default)]
struct FlakyStore {
    inner: InMemoryWorkflowStore,
    fail_audit: AtomicBool,
    fail_aggregate: AtomicBool,
}

struct FlakyTx<'a> {
    inner: &'a mut dyn WorkflowTx,
    fail_audit: bool,
    fail_aggregate: bool,
}

impl WorkflowTx for FlakyTx<'_> {
    fn workflow(&self) -> &Workflow {
        self.inner.workflow()
    }

    fn write_step(&mut self, step: &Step) -> Result<(), StoreError> {
        self.inner.write_step(step)
    }

    fn append_audit(&mut self, entry: NewAuditEntry) -> Result<AuditEntry, StoreError> {
        if self.fail_audit {
            return Err(StoreError::Unavailable("audit table offline".into()));
        }
        self.inner.append_audit(entry)
    }

    fn write_aggregate(&mut self, status: WorkflowStatus, updated_at: DateTime<Utc>) -> Result<(), StoreError> {
        if self.fail_aggregate {
            return Err(StoreError::Backend("check violation".into()));
        }
        self.inner.write_aggregate(status, updated_at)
    }
}

impl WorkflowStore for FlakyStore {
    fn get_or_create(&self, vehicle_id: &str, now: DateTime<Utc>) -> Result<Workflow, StoreError> {
        self.inner.get_or_create(vehicle_id, now)
    }

    fn load(&self, workflow_id: Uuid) -> Result<Option<Workflow>, StoreError> {
        self.inner.load(workflow_id)
    }

    fn find_by_vehicle(&self, vehicle_id: &str) -> Result<Option<Workflow>, StoreError> {
        self.inner.find_by_vehicle(vehicle_id)
    }

    fn aggregate_statuses(&self) -> Result<Vec<WorkflowStatus>, StoreError> {
        self.inner.aggregate_statuses()
    }

    fn transaction<T, F>(&self, workflow_id: Uuid, mut work: F) -> Result<T, WorkflowError>
        where F: FnMut(&mut dyn WorkflowTx) -> Result<T, WorkflowError>
    {
        let fail_audit = self.fail_audit.load(Ordering::SeqCst);
        let fail_aggregate = self.fail_aggregate.load(Ordering::SeqCst);
        self.inner.transaction(workflow_id, |tx| {
                      let mut flaky = FlakyTx { inner: tx,
                                                fail_audit,
                                                fail_aggregate };
                      work(&mut flaky)
                  })
    }
}

impl AuditLog for FlakyStore {
    fn list(&self, workflow_id: Uuid) -> Result<Vec<AuditEntry>, StoreError> {
        self.inner.list(workflow_id)
    }
}

fn hseq() -> Actor {
    Actor::new("ines", [Role::Hseq])
}

#[test]
fn audit_failure_leaves_step_untouched() {
    let engine = WorkflowEngine::new(FlakyStore::default());
    let wf = engine.get_workflow("TRK-200").unwrap();
    engine.store().fail_audit.store(true, Ordering::SeqCst);

    let err = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, hseq(), StepStatus::Valide))
                    .unwrap_err();
    assert!(matches!(err, WorkflowError::Storage(StoreError::Unavailable(_))));
    assert_eq!(classify_error(&err), ErrorClass::RetryLater);
    assert_eq!(engine.workflow(wf.id).unwrap(), wf);
    assert!(engine.history(wf.id).unwrap().is_empty());
}

#[test]
fn aggregate_failure_discards_step_and_audit() {
    let engine = WorkflowEngine::new(FlakyStore::default());
    let wf = engine.get_workflow("TRK-201").unwrap();
    engine.store().fail_aggregate.store(true, Ordering::SeqCst);

    let err = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, hseq(), StepStatus::Valide))
                    .unwrap_err();
    assert!(matches!(err, WorkflowError::Storage(StoreError::Backend(_))));
    assert_eq!(engine.workflow(wf.id).unwrap(), wf);
    assert!(engine.history(wf.id).unwrap().is_empty());

    // Recuperado el backend, la misma petición se aplica completa.
    engine.store().fail_aggregate.store(false, Ordering::SeqCst);
    let out = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, hseq(), StepStatus::Valide))
                    .unwrap();
    assert_eq!(out.step.status, StepStatus::Valide);
    assert_eq!(engine.history(wf.id).unwrap().len(), 1);
}
