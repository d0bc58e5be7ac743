//! Modelo de lectura sobre las entradas de un workflow.
//!
//! Sirve dos vistas: el historial completo (diálogo de historial) y la última
//! entrada por etapa (comentario y autor mostrados en línea).
use std::collections::BTreeMap;

use fleet_domain::{AuditEntry, StepKind, StepStatus};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuditHistory {
    entries: Vec<AuditEntry>,
}

impl AuditHistory {
    /// Ordena por `created_at` y desempata por `seq`.
    pub fn new(mut entries: Vec<AuditEntry>) -> Self {
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.seq.cmp(&b.seq)));
        Self { entries }
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<AuditEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_step(&self, kind: StepKind) -> impl Iterator<Item = &AuditEntry> + '_ {
        self.entries.iter().filter(move |e| e.step_kind == kind)
    }

    pub fn by_step(&self) -> BTreeMap<StepKind, Vec<&AuditEntry>> {
        let mut grouped: BTreeMap<StepKind, Vec<&AuditEntry>> = BTreeMap::new();
        for entry in &self.entries {
            grouped.entry(entry.step_kind).or_default().push(entry);
        }
        grouped
    }

    pub fn latest(&self, kind: StepKind) -> Option<&AuditEntry> {
        self.for_step(kind).last()
    }

    pub fn latest_per_step(&self) -> BTreeMap<StepKind, &AuditEntry> {
        self.entries.iter().map(|e| (e.step_kind, e)).collect()
    }

    /// Cada `previous_status` coincide con el `new_status` anterior de la
    /// misma etapa, partiendo de `en_attente`.
    pub fn is_chain_consistent(&self, kind: StepKind) -> bool {
        let mut expected = StepStatus::EnAttente;
        for entry in self.for_step(kind) {
            if entry.previous_status != expected {
                return false;
            }
            expected = entry.new_status;
        }
        true
    }
}
