use chrono::{Duration, Utc};
use fleet_core::{InMemoryWorkflowStore, TransitionRequest, WorkflowEngine, WorkflowError, WorkflowStore};
use fleet_domain::{Actor, Role, StepKind, StepStatus, WorkflowStatus};

#[test]
fn audit_time_never_precedes_last_update() {
    let engine = WorkflowEngine::new(InMemoryWorkflowStore::new());
    let wf = engine.get_workflow("TRK-400").unwrap();

    // Reloj de otro nodo adelantado una hora.
    let ahead = Utc::now() + Duration::hours(1);
    let res: Result<(), WorkflowError> = engine.store().transaction(wf.id, |tx| {
                                                           tx.write_aggregate(WorkflowStatus::EnValidation, ahead)?;
                                                           Ok(())
                                                       });
    res.unwrap();

    let first = engine.transition(TransitionRequest::new(wf.id,
                                                         StepKind::Hseq,
                                                         Actor::new("ines", [Role::Hseq]),
                                                         StepStatus::Valide))
                      .unwrap();
    let entry = first.audit_entry.clone().unwrap();
    assert!(entry.created_at >= ahead, "{} < {}", entry.created_at, ahead);
    assert!(first.step.validated_at.unwrap() >= ahead);

    let second = engine.transition(TransitionRequest::new(wf.id,
                                                          StepKind::Operations,
                                                          Actor::new("olga", [Role::Operations]),
                                                          StepStatus::Valide))
                       .unwrap();
    assert!(second.audit_entry.unwrap().created_at >= entry.created_at);

    let stored = engine.store().find_by_vehicle("TRK-400").unwrap().unwrap();
    assert!(stored.updated_at >= ahead);

    let history = engine.history(wf.id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}
