//! Demo: recorre los escenarios del workflow de habilitación sobre el backend
//! en memoria e imprime cada paso.

use std::process::ExitCode;

use fleetflow_rust::config::CONFIG;
use fleetflow_rust::{in_memory_engine, Actor, AppError, Role, StepKind, StepStatus, TransitionRequest, WorkflowError};

fn run() -> Result<(), AppError> {
    let engine = in_memory_engine(&CONFIG);

    // 1. Vehículo nuevo: cuatro etapas pendientes.
    let wf = engine.get_workflow("TRK-042")?;
    println!("[1] workflow={} aggregate={} steps={}", wf.id, wf.aggregate_status, wf.steps.len());

    // 2. HSEQ valida su etapa.
    let hseq = Actor::new("ines", [Role::Hseq]);
    let out = engine.transition(TransitionRequest::new(wf.id, StepKind::Hseq, hseq, StepStatus::Valide))?;
    println!("[2] hseq={} aggregate={} refresh={:?}", out.step.status, out.aggregate_status, out.invalidations());

    // 3. Mantenimiento intenta la etapa administrativa.
    let maintenance = Actor::new("marc", [Role::Maintenance]);
    match engine.transition(TransitionRequest::new(wf.id, StepKind::Administrative, maintenance.clone(), StepStatus::Valide)) {
        Err(e @ WorkflowError::Forbidden { .. }) => println!("[3] denied: {e}"),
        other => println!("[3] unexpected: {other:?}"),
    }

    // 4. El resto de etapas valida; el agregado pasa a `valide` con la cuarta.
    for (kind, role) in [(StepKind::Maintenance, Role::Maintenance),
                         (StepKind::Administrative, Role::Administrative),
                         (StepKind::Operations, Role::Operations)]
    {
        let out = engine.transition(TransitionRequest::new(wf.id, kind, Actor::new(format!("{role}-lead"), [role]),
                                                           StepStatus::Valide))?;
        println!("[4] {kind} -> {} aggregate={}", out.step.status, out.aggregate_status);
    }
    println!("[4] eligibility={}",
             serde_json::to_string(&engine.eligibility("TRK-042")?).unwrap_or_default());

    // 5. Un rechazo con comentario basta para rechazar el workflow.
    let out = engine.transition(TransitionRequest::new(wf.id, StepKind::Maintenance, Actor::new("marc", [Role::Maintenance]),
                                                       StepStatus::Rejete).with_comment("defective brake line"))?;
    println!("[5] aggregate={}", out.aggregate_status);

    for view in engine.step_views(wf.id, &maintenance)? {
        println!("    {:<14} {:<10} owner={:<14} editable={}",
                 view.kind.as_str(),
                 view.status.as_str(),
                 view.required_role.as_str(),
                 view.editable);
    }
    for entry in engine.history(wf.id)? {
        println!("    #{} {} {}->{} by {} ({}) {:?}",
                 entry.seq, entry.step_kind, entry.previous_status, entry.new_status, entry.actor_name,
                 entry.actor_role, entry.comment);
    }
    let stats = engine.global_stats()?;
    println!("stats total={} en_validation={} valide={} rejete={}",
             stats.total, stats.en_validation, stats.valide, stats.rejete);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
