use fleet_core::{InMemoryWorkflowStore, ReadView, TransitionRequest, WorkflowEngine, WorkflowError, WorkflowStore};
use fleet_domain::{Actor, Role, StepKind, StepStatus, WorkflowStatus, STEP_COUNT};

fn engine() -> WorkflowEngine<InMemoryWorkflowStore> {
    WorkflowEngine::new(InMemoryWorkflowStore::new())
}

fn holder(kind: StepKind) -> Actor {
    let role = match kind {
        StepKind::Maintenance => Role::Maintenance,
        StepKind::Administrative => Role::Administrative,
        StepKind::Hseq => Role::Hseq,
        StepKind::Operations => Role::Operations,
    };
    Actor::new(format!("{kind}-lead"), [role])
}

#[test]
fn new_vehicle_starts_with_four_pending_steps() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-100").unwrap();
    assert_eq!(wf.steps.len(), STEP_COUNT);
    assert!(wf.steps.iter().all(|s| s.status == StepStatus::EnAttente));
    assert!(wf.steps.iter().all(|s| s.validator_name.is_none() && s.validated_at.is_none()));
    assert_eq!(wf.aggregate_status, WorkflowStatus::EnValidation);
    let kinds: Vec<StepKind> = wf.steps.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, StepKind::ALL.to_vec());
}

#[test]
fn hseq_approval_keeps_workflow_in_validation() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-101").unwrap();
    let actor = Actor::new("ines", [Role::Hseq]);
    let out = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, actor, StepStatus::Valide))
                    .unwrap();
    assert_eq!(out.step.status, StepStatus::Valide);
    assert_eq!(out.step.validator_name.as_deref(), Some("ines"));
    assert_eq!(out.step.validator_role, Some(Role::Hseq));
    assert!(out.step.validated_at.is_some());
    assert_eq!(out.aggregate_status, WorkflowStatus::EnValidation);
    let history = engine.history(wf.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_status, StepStatus::EnAttente);
    assert_eq!(history[0].new_status, StepStatus::Valide);
    assert_eq!(history[0].comment, "");
}

#[test]
fn workflow_becomes_valid_only_after_fourth_approval() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-102").unwrap();
    for (i, kind) in StepKind::ALL.into_iter().enumerate() {
        let out = engine.transition(TransitionRequest::new(wf.id, kind, holder(kind), StepStatus::Valide))
                        .unwrap();
        let expected = if i + 1 == STEP_COUNT {
            WorkflowStatus::Valide
        } else {
            WorkflowStatus::EnValidation
        };
        assert_eq!(out.aggregate_status, expected, "after {kind}");
    }
    assert_eq!(engine.workflow(wf.id).unwrap().aggregate_status, WorkflowStatus::Valide);
    assert!(engine.eligibility("TRK-102").unwrap().dispatchable);
}

#[test]
fn maintenance_cannot_touch_administrative_step() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-103").unwrap();
    let before_wf = engine.workflow(wf.id).unwrap();
    let before_log = engine.step_history(wf.id, StepKind::Administrative).unwrap();

    let actor = Actor::new("marc", [Role::Maintenance]);
    let err = engine.transition(TransitionRequest::new(wf.id, StepKind::Administrative, actor, StepStatus::Valide))
                    .unwrap_err();
    match err {
        WorkflowError::Forbidden { step,
                                   required,
                                   actor_roles, } => {
            assert_eq!(step, StepKind::Administrative);
            assert_eq!(required, Role::Administrative);
            assert!(actor_roles.contains(Role::Maintenance));
        }
        other => panic!("expected Forbidden, got {other:?}"),
    }
    assert_eq!(engine.workflow(wf.id).unwrap(), before_wf);
    assert_eq!(engine.step_history(wf.id, StepKind::Administrative).unwrap(), before_log);
    assert!(engine.history(wf.id).unwrap().is_empty());
}

#[test]
fn single_rejection_rejects_workflow() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-104").unwrap();
    for kind in [StepKind::Maintenance, StepKind::Administrative, StepKind::Operations] {
        engine.transition(TransitionRequest::new(wf.id, kind, holder(kind), StepStatus::Valide))
              .unwrap();
    }
    let out = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, holder(StepKind::Hseq), StepStatus::Rejete)
                                .with_comment("defective brake line"))
                    .unwrap();
    assert_eq!(out.aggregate_status, WorkflowStatus::Rejete);
    assert_eq!(out.step.comment.as_deref(), Some("defective brake line"));
    let e = engine.eligibility("TRK-104").unwrap();
    assert!(!e.dispatchable);
    assert_eq!(e.blocking, vec![StepKind::Hseq]);
}

#[test]
fn rejection_without_comment_is_validation_error() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-105").unwrap();
    for comment in [None, Some(""), Some("   \t")] {
        let mut req = TransitionRequest::new(wf.id, StepKind::Hseq, holder(StepKind::Hseq), StepStatus::Rejete);
        req.comment = comment.map(str::to_string);
        let err = engine.transition(req).unwrap_err();
        assert!(matches!(&err, WorkflowError::Validation { field, message }
                         if field == "comment" && message == "comment required for rejection"),
                "{err:?}");
    }
    assert_eq!(engine.workflow(wf.id).unwrap(), wf);
    assert!(engine.history(wf.id).unwrap().is_empty());
}

#[test]
fn forbidden_wins_over_missing_comment() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-106").unwrap();
    let actor = Actor::new("marc", [Role::Maintenance]);
    let err = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, actor, StepStatus::Rejete))
                    .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { .. }));
}

#[test]
fn unknown_workflow_is_not_found_before_authorization() {
    let engine = engine();
    let nobody = Actor::new("x", Vec::<Role>::new());
    let err = engine.transition(TransitionRequest::new(uuid::Uuid::new_v4(), StepKind::Hseq, nobody, StepStatus::Valide))
                    .unwrap_err();
    assert!(matches!(err, WorkflowError::NotFound(_)));
    assert!(matches!(engine.history(uuid::Uuid::new_v4()), Err(WorkflowError::NotFound(_))));
}

#[test]
fn repeated_reads_have_no_side_effects() {
    let engine = engine();
    let a = engine.get_workflow("TRK-107").unwrap();
    let b = engine.get_workflow("TRK-107").unwrap();
    assert_eq!(a, b);
    assert_eq!(engine.store().len(), 1);
    assert!(engine.history(a.id).unwrap().is_empty());
}

#[test]
fn repeated_identical_transitions_are_each_audited() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-108").unwrap();
    for _ in 0..3 {
        let out = engine.transition(TransitionRequest::new(wf.id, StepKind::Operations, holder(StepKind::Operations),
                                                           StepStatus::Valide))
                        .unwrap();
        assert!(out.changed());
    }
    let entries = engine.step_history(wf.id, StepKind::Operations).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].previous_status, StepStatus::Valide);
    assert_eq!(entries[2].previous_status, StepStatus::Valide);
}

#[test]
fn strict_mode_skips_unchanged_transitions() {
    let engine = WorkflowEngine::builder(InMemoryWorkflowStore::new()).audit_unchanged_transitions(false)
                                                                      .build();
    let wf = engine.get_workflow("TRK-109").unwrap();
    let first = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, holder(StepKind::Hseq), StepStatus::Valide))
                      .unwrap();
    assert!(first.changed());
    let after_first = engine.workflow(wf.id).unwrap();

    let again = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, holder(StepKind::Hseq), StepStatus::Valide))
                      .unwrap();
    assert!(!again.changed());
    assert!(again.invalidations().is_empty());
    assert_eq!(engine.workflow(wf.id).unwrap(), after_first);
    assert_eq!(engine.history(wf.id).unwrap().len(), 1);

    // Un comentario distinto sí es un cambio.
    let commented = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, holder(StepKind::Hseq), StepStatus::Valide)
                                      .with_comment("extintor revisado"))
                          .unwrap();
    assert!(commented.changed());
    assert_eq!(engine.history(wf.id).unwrap().len(), 2);
}

#[test]
fn admin_override_is_recorded_as_admin() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-110").unwrap();
    let boss = Actor::new("chef", [Role::Admin]);
    let out = engine.transition(TransitionRequest::new(wf.id, StepKind::Maintenance, boss, StepStatus::Valide))
                    .unwrap();
    assert_eq!(out.step.validator_role, Some(Role::Admin));
    assert_eq!(out.audit_entry.map(|e| e.actor_role), Some(Role::Admin));

    let both = Actor::new("dual", [Role::Admin, Role::Hseq]);
    let out = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, both, StepStatus::Valide))
                    .unwrap();
    assert_eq!(out.step.validator_role, Some(Role::Hseq));
}

#[test]
fn steps_can_be_reopened_and_flipped() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-111").unwrap();
    let a = holder(StepKind::Maintenance);
    let path = [StepStatus::Valide, StepStatus::EnAttente, StepStatus::Rejete, StepStatus::Valide];
    for target in path {
        let mut req = TransitionRequest::new(wf.id, StepKind::Maintenance, a.clone(), target);
        if target == StepStatus::Rejete {
            req = req.with_comment("fuite d'huile");
        }
        engine.transition(req).unwrap();
    }
    let history = engine.audit_history(wf.id).unwrap();
    assert_eq!(history.len(), path.len());
    assert!(history.is_chain_consistent(StepKind::Maintenance));
    assert_eq!(history.latest(StepKind::Maintenance).map(|e| e.new_status), Some(StepStatus::Valide));
    // El comentario de rechazo no se arrastra a la validación posterior.
    assert_eq!(engine.workflow(wf.id).unwrap().step(StepKind::Maintenance).comment, None);
}

#[test]
fn successful_transition_lists_views_to_refresh() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-112").unwrap();
    let out = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, holder(StepKind::Hseq), StepStatus::Valide))
                    .unwrap();
    assert_eq!(out.invalidations(),
               vec![ReadView::WorkflowSteps(wf.id),
                    ReadView::History(wf.id),
                    ReadView::VehicleEligibility("TRK-112".into()),
                    ReadView::VehicleList]);
}

#[test]
fn global_stats_are_recomputed_on_read() {
    let engine = engine();
    assert_eq!(engine.global_stats().unwrap().total, 0);
    let ok = engine.get_workflow("TRK-A").unwrap();
    let ko = engine.get_workflow("TRK-B").unwrap();
    engine.get_workflow("TRK-C").unwrap();
    for kind in StepKind::ALL {
        engine.transition(TransitionRequest::new(ok.id, kind, holder(kind), StepStatus::Valide))
              .unwrap();
    }
    engine.transition(TransitionRequest::new(ko.id, StepKind::Operations, holder(StepKind::Operations), StepStatus::Rejete)
                      .with_comment("chauffeur indisponible"))
          .unwrap();
    let stats = engine.global_stats().unwrap();
    assert_eq!((stats.total, stats.en_validation, stats.valide, stats.rejete), (3, 1, 1, 1));

    engine.transition(TransitionRequest::new(ko.id, StepKind::Operations, holder(StepKind::Operations), StepStatus::EnAttente))
          .unwrap();
    let stats = engine.global_stats().unwrap();
    assert_eq!((stats.en_validation, stats.rejete), (2, 0));
}

#[test]
fn step_views_show_denied_steps_read_only() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-113").unwrap();
    engine.transition(TransitionRequest::new(wf.id, StepKind::Administrative, holder(StepKind::Administrative),
                                             StepStatus::Rejete).with_comment("assurance expirée"))
          .unwrap();
    let viewer = Actor::new("marc", [Role::Maintenance]);
    let views = engine.step_views(wf.id, &viewer).unwrap();
    assert_eq!(views.len(), STEP_COUNT);
    let admin = views.iter().find(|v| v.kind == StepKind::Administrative).unwrap();
    assert!(!admin.editable);
    assert_eq!(admin.status, StepStatus::Rejete);
    assert_eq!(admin.required_role, Role::Administrative);
    assert!(admin.actor_roles.contains(Role::Maintenance));
    assert_eq!(admin.last_entry.as_ref().map(|e| e.comment.as_str()), Some("assurance expirée"));
    assert!(views.iter().find(|v| v.kind == StepKind::Maintenance).unwrap().editable);
}

#[test]
fn empty_vehicle_id_and_actor_are_rejected() {
    let engine = engine();
    assert!(matches!(engine.get_workflow("  "), Err(WorkflowError::Validation { .. })));
    let wf = engine.get_workflow("TRK-114").unwrap();
    let anonymous = Actor::new(" ", [Role::Hseq]);
    let err = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, anonymous, StepStatus::Valide))
                    .unwrap_err();
    assert!(matches!(err, WorkflowError::Validation { field, .. } if field == "actor"));
    assert!(engine.store().find_by_vehicle("TRK-114").unwrap().is_some());
}

#[test]
fn blank_unauthorized_actor_is_forbidden_first() {
    let engine = engine();
    let wf = engine.get_workflow("TRK-115").unwrap();
    let anonymous = Actor::new(" ", [Role::Maintenance]);
    let err = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, anonymous, StepStatus::Valide))
                    .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { .. }), "{err:?}");
    assert!(engine.history(wf.id).unwrap().is_empty());
}
