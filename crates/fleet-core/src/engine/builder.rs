//! Builder del engine.
use fleet_policies::{RoleAuthority, StaticRoleAuthority};

use crate::audit::AuditLog;
use crate::engine::{EngineConfig, WorkflowEngine};
use crate::store::WorkflowStore;

pub struct EngineBuilder<S>
    where S: WorkflowStore + AuditLog
{
    store: S,
    config: EngineConfig,
    authority: Box<dyn RoleAuthority>,
}

impl<S> EngineBuilder<S> where S: WorkflowStore + AuditLog
{
    pub fn new(store: S) -> Self {
        Self { store,
               config: EngineConfig::default(),
               authority: Box::new(StaticRoleAuthority::new()) }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn audit_unchanged_transitions(mut self, enabled: bool) -> Self {
        self.config.audit_unchanged_transitions = enabled;
        self
    }

    pub fn authority(mut self, authority: impl RoleAuthority + 'static) -> Self {
        self.authority = Box::new(authority);
        self
    }

    pub fn build(self) -> WorkflowEngine<S> {
        WorkflowEngine::from_parts(self.store, self.authority, self.config)
    }
}
