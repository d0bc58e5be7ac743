//! Historial de auditoría: contrato append-only y modelo de lectura.

mod history;
mod store;

pub use history::AuditHistory;
pub use store::{AuditLog, NewAuditEntry};
