//! fleet-policies – Autoridad de roles del workflow de habilitación
//!
//! Decide si un actor puede modificar una etapa. Es la única implementación de
//! la regla: el engine la consulta antes de cualquier escritura y las vistas
//! sólo la usan para mostrar si una etapa es editable.
//!
//! Mapeo estático 1:1 etapa → rol, más el rol `admin` autorizado en las
//! cuatro etapas.

use fleet_domain::{Role, RoleSet, StepKind};
use log::trace;
use serde::{Deserialize, Serialize};

/// Contrato de autorización consultado por el engine.
pub trait RoleAuthority: Send + Sync {
    /// Rol dueño de la etapa.
    fn required_role(&self, kind: StepKind) -> Role;

    /// Rol con el que el actor queda autorizado, o `None` si no lo está.
    /// El rol devuelto es el que se registra como `validator_role`.
    fn authorize(&self, roles: &RoleSet, kind: StepKind) -> Option<Role>;

    fn can_validate(&self, roles: &RoleSet, kind: StepKind) -> bool {
        self.authorize(roles, kind).is_some()
    }
}

/// Autoridad estática: cada etapa pertenece al rol homónimo; `admin` puede
/// todas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoleAuthority;

impl StaticRoleAuthority {
    pub const OVERRIDE_ROLE: Role = Role::Admin;

    pub fn new() -> Self {
        Self
    }
}

impl RoleAuthority for StaticRoleAuthority {
    fn required_role(&self, kind: StepKind) -> Role {
        required_role(kind)
    }

    fn authorize(&self, roles: &RoleSet, kind: StepKind) -> Option<Role> {
        let owner = required_role(kind);
        // El rol propio de la etapa tiene prioridad sobre el override para
        // que la auditoría refleje la competencia real del validador.
        let granted = if roles.contains(owner) {
            Some(owner)
        } else if roles.contains(Self::OVERRIDE_ROLE) {
            Some(Self::OVERRIDE_ROLE)
        } else {
            None
        };
        trace!("authorize step={kind} roles={roles} granted={granted:?}");
        granted
    }
}

/// Rol dueño de cada etapa.
pub const fn required_role(kind: StepKind) -> Role {
    match kind {
        StepKind::Maintenance => Role::Maintenance,
        StepKind::Administrative => Role::Administrative,
        StepKind::Hseq => Role::Hseq,
        StepKind::Operations => Role::Operations,
    }
}

/// Atajo sobre `StaticRoleAuthority`.
pub fn can_validate(roles: &RoleSet, kind: StepKind) -> bool {
    StaticRoleAuthority.can_validate(roles, kind)
}
