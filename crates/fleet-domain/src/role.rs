//! Roles de usuario y actor que ejecuta una transición.
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Roles relevantes para el workflow de habilitación. El resto de roles del
/// directorio de usuarios (conductor, facturación, ...) no participa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Maintenance,
    Administrative,
    Hseq,
    Operations,
    /// Puede validar cualquier etapa.
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Maintenance => "maintenance",
            Role::Administrative => "administrative",
            Role::Hseq => "hseq",
            Role::Operations => "operations",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "maintenance" => Ok(Role::Maintenance),
            "administrative" | "administratif" => Ok(Role::Administrative),
            "hseq" => Ok(Role::Hseq),
            "operations" | "exploitation" => Ok(Role::Operations),
            "admin" | "administrateur" | "administrator" => Ok(Role::Admin),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// Conjunto ordenado de roles de un actor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construye el conjunto a partir de nombres del directorio de usuarios.
    /// Los nombres que no corresponden a un rol del workflow se ignoran.
    pub fn from_names<I, S>(names: I) -> Self
        where I: IntoIterator<Item = S>,
              S: AsRef<str>
    {
        names.into_iter().filter_map(|n| n.as_ref().parse::<Role>().ok()).collect()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|r| r.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Usuario autenticado que intenta una transición.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub roles: RoleSet,
}

impl Actor {
    pub fn new(name: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self { name: name.into(),
               roles: roles.into_iter().collect() }
    }
}
