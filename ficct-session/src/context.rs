//! Auth Context
//!
//! Role and permission predicates evaluated against a session snapshot.
//! These decide which controls to render; the backend still authorizes
//! every request on its own.

use crate::permissions::PermissionSet;
use crate::role::{Role, RoleRequirement};
use crate::store::{Session, SessionStore};

/// Authorization view of the current session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthContext {
    role: Option<Role>,
    permissions: PermissionSet,
}

impl AuthContext {
    pub fn new(role: Option<Role>, permissions: PermissionSet) -> Self {
        Self { role, permissions }
    }

    /// Build from a snapshot; role and permissions are ignored without a token
    pub fn from_session(session: &Session) -> Self {
        if !session.is_authenticated() {
            return Self::default();
        }
        Self::new(session.role, session.permissions.clone())
    }

    pub fn from_store(store: &SessionStore) -> Self {
        Self::from_session(&store.snapshot())
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    pub fn is_coordinador(&self) -> bool {
        self.role == Some(Role::Coordinador)
    }

    pub fn is_autoridad(&self) -> bool {
        self.role == Some(Role::Autoridad)
    }

    pub fn is_docente(&self) -> bool {
        self.role == Some(Role::Docente)
    }

    /// Admin passes every check; otherwise the role must satisfy `required`
    pub fn can_access(&self, required: impl Into<RoleRequirement>) -> bool {
        required.into().allows(self.role)
    }

    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.contains(name)
    }

    pub fn has_all_permissions(&self, names: &[&str]) -> bool {
        names.iter().all(|name| self.has_permission(name))
    }

    pub fn has_any_permission(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has_permission(name))
    }

    /// Create a summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "AuthContext[role={}, permissions={}]",
            self.role.map(|r| r.as_str()).unwrap_or("none"),
            self.permissions.len()
        )
    }
}
