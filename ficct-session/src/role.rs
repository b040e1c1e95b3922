//! User roles
//!
//! Roles are the coarse authorization currency of the system. The backend
//! sends them as lowercase Spanish strings; anything else is treated as
//! "no role".

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// User role classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System administrator, passes every role check
    Admin,
    /// Career coordinator, manages schedules and instructors
    Coordinador,
    /// Faculty authority, reads reports and attendance
    Autoridad,
    /// Instructor, sees their own schedule and attendance
    Docente,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Coordinador, Role::Autoridad, Role::Docente];

    /// Wire representation stored under the `rol` key
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Coordinador => "coordinador",
            Role::Autoridad => "autoridad",
            Role::Docente => "docente",
        }
    }

    /// Parse a stored role string; exact match only, unknown or empty is `None`
    pub fn from_wire(value: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == value)
    }

    /// Landing page of the role-scoped dashboard
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Coordinador => "/coordinador",
            Role::Autoridad => "/autoridad",
            Role::Docente => "/docente",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrador",
            Role::Coordinador => "Coordinador",
            Role::Autoridad => "Autoridad",
            Role::Docente => "Docente",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::from_wire(s).ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// The roles allowed to reach a page or control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    One(Role),
    /// Any member passes; an empty set places no restriction at all
    AnyOf(BTreeSet<Role>),
}

impl RoleRequirement {
    /// Requirement that every session satisfies
    pub fn unrestricted() -> Self {
        RoleRequirement::AnyOf(BTreeSet::new())
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, RoleRequirement::AnyOf(roles) if roles.is_empty())
    }

    /// Decide whether a session holding `role` passes
    pub fn allows(&self, role: Option<Role>) -> bool {
        if self.is_unrestricted() {
            return true;
        }

        match role {
            Some(Role::Admin) => true,
            Some(role) => match self {
                RoleRequirement::One(required) => *required == role,
                RoleRequirement::AnyOf(roles) => roles.contains(&role),
            },
            None => false,
        }
    }
}

impl From<Role> for RoleRequirement {
    fn from(role: Role) -> Self {
        RoleRequirement::One(role)
    }
}

impl<const N: usize> From<[Role; N]> for RoleRequirement {
    fn from(roles: [Role; N]) -> Self {
        RoleRequirement::AnyOf(roles.into_iter().collect())
    }
}

impl From<&[Role]> for RoleRequirement {
    fn from(roles: &[Role]) -> Self {
        RoleRequirement::AnyOf(roles.iter().copied().collect())
    }
}

impl From<Vec<Role>> for RoleRequirement {
    fn from(roles: Vec<Role>) -> Self {
        RoleRequirement::AnyOf(roles.into_iter().collect())
    }
}

impl From<BTreeSet<Role>> for RoleRequirement {
    fn from(roles: BTreeSet<Role>) -> Self {
        RoleRequirement::AnyOf(roles)
    }
}
