//! Core WorkflowEngine implementation

use chrono::Utc;
use fleet_domain::{Actor, AuditEntry, Step, StepKind, StepStatus, Workflow, WorkflowStats};
use fleet_policies::RoleAuthority;
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::aggregate::aggregate_steps;
use crate::audit::{AuditHistory, AuditLog, NewAuditEntry};
use crate::constants::COMMENT_REQUIRED_FOR_REJECTION;
use crate::engine::{EngineBuilder, EngineConfig, TransitionOutcome, TransitionRequest};
use crate::errors::{classify_error, ErrorClass, WorkflowError};
use crate::store::WorkflowStore;
use crate::view::{Eligibility, StepView};

/// Motor del workflow de habilitación.
///
/// No guarda estado propio más allá del store: es la fuente de verdad y los
/// llamadores deben volver a leer tras cada transición exitosa (ver
/// `TransitionOutcome::invalidations`).
pub struct WorkflowEngine<S>
    where S: WorkflowStore + AuditLog
{
    store: S,
    authority: Box<dyn RoleAuthority>,
    config: EngineConfig,
}

impl<S> WorkflowEngine<S> where S: WorkflowStore + AuditLog
{
    /// Engine con autoridad estática y configuración por defecto.
    #[inline]
    pub fn new(store: S) -> Self {
        Self::builder(store).build()
    }

    #[inline]
    pub fn builder(store: S) -> EngineBuilder<S> {
        EngineBuilder::new(store)
    }

    pub(crate) fn from_parts(store: S, authority: Box<dyn RoleAuthority>, config: EngineConfig) -> Self {
        Self { store,
               authority,
               config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn authority(&self) -> &dyn RoleAuthority {
        self.authority.as_ref()
    }

    /// Workflow del vehículo; se crea con las cuatro etapas pendientes en el
    /// primer acceso.
    pub fn get_workflow(&self, vehicle_id: &str) -> Result<Workflow, WorkflowError> {
        let vehicle_id = vehicle_id.trim();
        if vehicle_id.is_empty() {
            return Err(WorkflowError::validation("vehicle_id", "vehicle id must not be empty"));
        }
        let workflow = self.store.get_or_create(vehicle_id, Utc::now())?;
        debug!("get_workflow vehicle={vehicle_id} workflow={} aggregate={}",
               workflow.id, workflow.aggregate_status);
        Ok(workflow)
    }

    /// Workflow por id, sin creación.
    pub fn workflow(&self, workflow_id: Uuid) -> Result<Workflow, WorkflowError> {
        self.store
            .load(workflow_id)?
            .ok_or_else(|| WorkflowError::workflow_not_found(workflow_id))
    }

    /// Aplica una transición.
    ///
    /// Orden de verificación: existencia (`NotFound`), rol (`Forbidden`),
    /// comentario obligatorio en rechazo (`Validation`). Si alguna falla no
    /// se escribe nada. Si todas pasan, la etapa, la entrada de auditoría y el
    /// agregado se escriben en la misma transacción.
    pub fn transition(&self, request: TransitionRequest) -> Result<TransitionOutcome, WorkflowError> {
        let TransitionRequest { workflow_id,
                                step,
                                actor,
                                target,
                                comment } = request;
        let comment = comment.as_deref().map(str::trim).unwrap_or_default().to_string();
        let actor_name = actor.name.trim().to_string();

        let result = self.store.transaction(workflow_id, |tx| {
            let role = self.authority
                           .authorize(&actor.roles, step)
                           .ok_or_else(|| WorkflowError::Forbidden { step,
                                                                     required: self.authority.required_role(step),
                                                                     actor_roles: actor.roles.clone() })?;
            // Va después del rol: un actor sin permisos recibe `Forbidden`
            // aunque además venga sin nombre.
            if actor_name.is_empty() {
                return Err(WorkflowError::validation("actor", "actor identity must not be empty"));
            }
            if target == StepStatus::Rejete && comment.is_empty() {
                return Err(WorkflowError::validation("comment", COMMENT_REQUIRED_FOR_REJECTION));
            }

            let workflow = tx.workflow();
            let current = workflow.step(step).clone();
            let vehicle_id = workflow.vehicle_id.clone();
            let last_update = workflow.updated_at;
            let stored_comment = (!comment.is_empty()).then(|| comment.clone());

            if !self.config.audit_unchanged_transitions
               && current.status == target
               && current.comment == stored_comment
            {
                return Ok(TransitionOutcome { workflow_id,
                                              vehicle_id,
                                              previous_status: current.status,
                                              aggregate_status: workflow.aggregate_status,
                                              step: current,
                                              audit_entry: None });
            }

            // El historial de un workflow nunca retrocede en el tiempo.
            let at = Utc::now().max(last_update);
            let updated = Step { status: target,
                                 comment: stored_comment,
                                 validator_name: Some(actor_name.clone()),
                                 validator_role: Some(role),
                                 validated_at: Some(at),
                                 ..current.clone() };
            tx.write_step(&updated)?;
            let entry = tx.append_audit(NewAuditEntry { workflow_id,
                                                        step_kind: step,
                                                        previous_status: current.status,
                                                        new_status: target,
                                                        comment: comment.clone(),
                                                        actor_name: actor_name.clone(),
                                                        actor_role: role,
                                                        created_at: at })?;
            let aggregate_status = aggregate_steps(&tx.workflow().steps);
            tx.write_aggregate(aggregate_status, at)?;

            Ok(TransitionOutcome { workflow_id,
                                   vehicle_id,
                                   step: updated,
                                   previous_status: current.status,
                                   aggregate_status,
                                   audit_entry: Some(entry) })
        });

        match &result {
            Ok(outcome) if outcome.changed() => info!("transition committed workflow={workflow_id} step={step} {}->{} actor={actor_name} aggregate={}",
                                                      outcome.previous_status, target, outcome.aggregate_status),
            Ok(_) => debug!("transition unchanged workflow={workflow_id} step={step} status={target} (skipped)"),
            Err(e) => match classify_error(e) {
                ErrorClass::Actionable | ErrorClass::StaleView => {
                    warn!("transition rejected workflow={workflow_id} step={step} actor={actor_name}: {e}")
                }
                ErrorClass::RetryLater => error!("transition failed workflow={workflow_id} step={step}: {e}"),
            },
        }
        result
    }

    /// Historial completo en orden cronológico.
    pub fn history(&self, workflow_id: Uuid) -> Result<Vec<AuditEntry>, WorkflowError> {
        Ok(self.audit_history(workflow_id)?.into_entries())
    }

    /// Historial de una etapa en orden cronológico.
    pub fn step_history(&self, workflow_id: Uuid, kind: StepKind) -> Result<Vec<AuditEntry>, WorkflowError> {
        self.ensure_exists(workflow_id)?;
        Ok(AuditHistory::new(self.store.list_for_step(workflow_id, kind)?).into_entries())
    }

    pub fn audit_history(&self, workflow_id: Uuid) -> Result<AuditHistory, WorkflowError> {
        self.ensure_exists(workflow_id)?;
        Ok(AuditHistory::new(self.store.list(workflow_id)?))
    }

    /// Conteo por estado agregado, recalculado en cada lectura.
    pub fn global_stats(&self) -> Result<WorkflowStats, WorkflowError> {
        Ok(self.store.aggregate_statuses()?.into_iter().collect())
    }

    /// Señal de despacho del vehículo (crea el workflow si aún no existe).
    pub fn eligibility(&self, vehicle_id: &str) -> Result<Eligibility, WorkflowError> {
        let workflow = self.get_workflow(vehicle_id)?;
        Ok(Eligibility::of(&workflow))
    }

    /// Vistas por etapa para el actor: todas visibles, marcadas editables
    /// sólo donde la autoridad lo permite.
    pub fn step_views(&self, workflow_id: Uuid, actor: &Actor) -> Result<Vec<StepView>, WorkflowError> {
        let workflow = self.workflow(workflow_id)?;
        let history = AuditHistory::new(self.store.list(workflow_id)?);
        Ok(StepView::for_workflow(&workflow, &history, actor, self.authority()))
    }

    fn ensure_exists(&self, workflow_id: Uuid) -> Result<(), WorkflowError> {
        self.workflow(workflow_id).map(|_| ())
    }
}
