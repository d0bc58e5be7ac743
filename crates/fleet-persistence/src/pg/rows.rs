//! Filas Diesel y su mapeo a tipos de dominio.
//!
//! Los enums se guardan como texto (`as_str`) y se reconvierten con
//! `FromStr`; un valor desconocido es `PersistenceError::InvalidRow`.
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use fleet_core::NewAuditEntry;
use fleet_domain::{AuditEntry, Role, Step, StepKind, StepStatus, Workflow, WorkflowStatus};
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::schema::{vehicle_workflows, workflow_audit_log, workflow_steps};

#[derive(Queryable, Debug)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub vehicle_id: String,
    pub aggregate_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = vehicle_workflows)]
pub struct NewWorkflowRow<'a> {
    pub id: Uuid,
    pub vehicle_id: &'a str,
    pub aggregate_status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Insertable, Debug)]
#[diesel(table_name = workflow_steps)]
pub struct StepRow {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub kind: String,
    pub status: String,
    pub comment: Option<String>,
    pub validator_name: Option<String>,
    pub validator_role: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
}

/// Columnas mutables de una etapa.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = workflow_steps, treat_none_as_null = true)]
pub struct StepChanges<'a> {
    pub status: &'a str,
    pub comment: Option<&'a str>,
    pub validator_name: Option<&'a str>,
    pub validator_role: Option<&'a str>,
    pub validated_at: Option<DateTime<Utc>>,
}

#[derive(Queryable, Debug)]
pub struct AuditRow {
    pub seq: i64,
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub step_kind: String,
    pub previous_status: String,
    pub new_status: String,
    pub comment: String,
    pub actor_name: String,
    pub actor_role: String,
    pub created_at: DateTime<Utc>,
}

/// `seq` lo asigna la base (BIGSERIAL) vía `RETURNING`.
#[derive(Insertable, Debug)]
#[diesel(table_name = workflow_audit_log)]
pub struct NewAuditRow<'a> {
    pub id: Uuid,
    pub workflow_id: Uuid,
    pub step_kind: &'a str,
    pub previous_status: &'a str,
    pub new_status: &'a str,
    pub comment: &'a str,
    pub actor_name: &'a str,
    pub actor_role: &'a str,
    pub created_at: DateTime<Utc>,
}

impl StepRow {
    pub fn from_step(step: &Step) -> Self {
        Self { id: step.id,
               workflow_id: step.workflow_id,
               kind: step.kind.as_str().to_string(),
               status: step.status.as_str().to_string(),
               comment: step.comment.clone(),
               validator_name: step.validator_name.clone(),
               validator_role: step.validator_role.map(|r| r.as_str().to_string()),
               validated_at: step.validated_at }
    }

    pub fn into_step(self) -> Result<Step, PersistenceError> {
        Ok(Step { id: self.id,
                  workflow_id: self.workflow_id,
                  kind: self.kind.parse::<StepKind>()?,
                  status: self.status.parse::<StepStatus>()?,
                  comment: self.comment,
                  validator_name: self.validator_name,
                  validator_role: self.validator_role.as_deref().map(str::parse::<Role>).transpose()?,
                  validated_at: self.validated_at })
    }
}

impl<'a> StepChanges<'a> {
    pub fn from_step(step: &'a Step) -> Self {
        Self { status: step.status.as_str(),
               comment: step.comment.as_deref(),
               validator_name: step.validator_name.as_deref(),
               validator_role: step.validator_role.map(Role::as_str),
               validated_at: step.validated_at }
    }
}

impl<'a> NewAuditRow<'a> {
    pub fn from_entry(id: Uuid, entry: &'a NewAuditEntry) -> Self {
        Self { id,
               workflow_id: entry.workflow_id,
               step_kind: entry.step_kind.as_str(),
               previous_status: entry.previous_status.as_str(),
               new_status: entry.new_status.as_str(),
               comment: &entry.comment,
               actor_name: &entry.actor_name,
               actor_role: entry.actor_role.as_str(),
               created_at: entry.created_at }
    }
}

impl AuditRow {
    pub fn into_entry(self) -> Result<AuditEntry, PersistenceError> {
        let seq = u64::try_from(self.seq).map_err(|_| PersistenceError::InvalidRow(format!("negative seq {}", self.seq)))?;
        Ok(AuditEntry { id: self.id,
                        seq,
                        workflow_id: self.workflow_id,
                        step_kind: self.step_kind.parse()?,
                        previous_status: self.previous_status.parse()?,
                        new_status: self.new_status.parse()?,
                        comment: self.comment,
                        actor_name: self.actor_name,
                        actor_role: self.actor_role.parse()?,
                        created_at: self.created_at })
    }
}

pub fn parse_aggregate(raw: &str) -> Result<WorkflowStatus, PersistenceError> {
    Ok(raw.parse::<WorkflowStatus>()?)
}

/// Ensambla el workflow desde su fila y sus cuatro etapas.
pub fn workflow_from_rows(row: WorkflowRow, steps: Vec<StepRow>) -> Result<Workflow, PersistenceError> {
    let steps = steps.into_iter().map(StepRow::into_step).collect::<Result<Vec<_>, _>>()?;
    Ok(Workflow::from_parts(row.id,
                            row.vehicle_id,
                            parse_aggregate(&row.aggregate_status)?,
                            steps,
                            row.created_at,
                            row.updated_at)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_row_maps_back_to_domain() {
        let wf = Workflow::new(Uuid::new_v4(), "TRK-1", Utc::now());
        let mut step = wf.step(StepKind::Hseq).clone();
        step.status = StepStatus::Rejete;
        step.comment = Some("extincteur manquant".into());
        step.validator_role = Some(Role::Admin);
        let back = StepRow::from_step(&step).into_step().unwrap();
        assert_eq!(back, step);
    }

    #[test]
    fn unknown_text_is_invalid_row() {
        let row = AuditRow { seq: 1,
                             id: Uuid::new_v4(),
                             workflow_id: Uuid::new_v4(),
                             step_kind: "billing".into(),
                             previous_status: "en_attente".into(),
                             new_status: "valide".into(),
                             comment: String::new(),
                             actor_name: "x".into(),
                             actor_role: "hseq".into(),
                             created_at: Utc::now() };
        assert!(matches!(row.into_entry(), Err(PersistenceError::InvalidRow(_))));
    }

    #[test]
    fn workflow_requires_all_four_steps() {
        let wf = Workflow::new(Uuid::new_v4(), "TRK-2", Utc::now());
        let row = WorkflowRow { id: wf.id,
                                vehicle_id: wf.vehicle_id.clone(),
                                aggregate_status: "en_validation".into(),
                                created_at: wf.created_at,
                                updated_at: wf.updated_at };
        let steps = wf.steps[..3].iter().map(StepRow::from_step).collect();
        assert!(matches!(workflow_from_rows(row, steps), Err(PersistenceError::InvalidRow(_))));
    }
}
