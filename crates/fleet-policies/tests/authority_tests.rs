use fleet_domain::{RoleSet, StepKind};
use fleet_policies::{RoleAuthority, StaticRoleAuthority};

#[test]
fn directory_role_names_resolve_to_step_permissions() {
    // Roles tal como llegan del directorio de usuarios, incluyendo ajenos.
    let roles = RoleSet::from_names(["chauffeur", "exploitation", "comptabilite"]);
    let authority = StaticRoleAuthority::new();
    assert!(authority.can_validate(&roles, StepKind::Operations));
    assert!(!authority.can_validate(&roles, StepKind::Maintenance));
    assert!(!authority.can_validate(&roles, StepKind::Administrative));
    assert!(!authority.can_validate(&roles, StepKind::Hseq));
}

#[test]
fn administrateur_alias_is_override() {
    let roles = RoleSet::from_names(["administrateur"]);
    assert!(StepKind::ALL.iter().all(|k| StaticRoleAuthority.can_validate(&roles, *k)));
}
