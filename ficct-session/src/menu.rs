//! Role-filtered navigation menu

use crate::context::AuthContext;
use crate::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
    /// Roles that see the entry; empty means everyone
    pub roles: &'static [Role],
    /// Permission additionally required, admin excepted
    pub permission: Option<&'static str>,
}

impl MenuItem {
    pub fn is_visible(&self, ctx: &AuthContext) -> bool {
        if !ctx.can_access(self.roles) {
            return false;
        }
        match self.permission {
            Some(permission) => ctx.is_admin() || ctx.has_permission(permission),
            None => true,
        }
    }
}

pub const MENU: &[MenuItem] = &[
    MenuItem {
        label: "Inicio",
        path: "/dashboard",
        roles: &[],
        permission: None,
    },
    MenuItem {
        label: "Docentes",
        path: "/admin/docentes",
        roles: &[Role::Admin, Role::Coordinador],
        permission: Some("docentes.ver"),
    },
    MenuItem {
        label: "Carreras",
        path: "/admin/carreras",
        roles: &[Role::Admin],
        permission: None,
    },
    MenuItem {
        label: "Materias",
        path: "/admin/materias",
        roles: &[Role::Admin, Role::Coordinador],
        permission: None,
    },
    MenuItem {
        label: "Aulas",
        path: "/admin/aulas",
        roles: &[Role::Admin, Role::Coordinador],
        permission: None,
    },
    MenuItem {
        label: "Roles y permisos",
        path: "/admin/roles",
        roles: &[Role::Admin],
        permission: None,
    },
    MenuItem {
        label: "Bitácora",
        path: "/admin/bitacora",
        roles: &[Role::Admin],
        permission: Some("bitacoras.ver"),
    },
    MenuItem {
        label: "Horarios docentes",
        path: "/coordinador/horarios",
        roles: &[Role::Coordinador],
        permission: None,
    },
    MenuItem {
        label: "Asistencias",
        path: "/autoridad/asistencias",
        roles: &[Role::Autoridad, Role::Coordinador],
        permission: None,
    },
    MenuItem {
        label: "Reportes",
        path: "/autoridad/reportes",
        roles: &[Role::Autoridad],
        permission: Some("reportes.ver"),
    },
    MenuItem {
        label: "Mi horario",
        path: "/docente/mi-horario",
        roles: &[Role::Docente],
        permission: None,
    },
];

/// Menu entries the session should see, in menu order
pub fn visible_items(ctx: &AuthContext) -> Vec<&'static MenuItem> {
    MENU.iter().filter(|item| item.is_visible(ctx)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PermissionSet;

    fn paths(ctx: &AuthContext) -> Vec<&'static str> {
        visible_items(ctx).into_iter().map(|item| item.path).collect()
    }

    #[test]
    fn test_admin_sees_everything() {
        let ctx = AuthContext::new(Some(Role::Admin), PermissionSet::new());
        assert_eq!(visible_items(&ctx).len(), MENU.len());
    }

    #[test]
    fn test_docente_menu() {
        let ctx = AuthContext::new(Some(Role::Docente), PermissionSet::new());
        assert_eq!(paths(&ctx), vec!["/dashboard", "/docente/mi-horario"]);
    }

    #[test]
    fn test_permission_narrows_role_match() {
        let without = AuthContext::new(Some(Role::Coordinador), PermissionSet::new());
        assert!(!paths(&without).contains(&"/admin/docentes"));

        let with = AuthContext::new(
            Some(Role::Coordinador),
            ["docentes.ver"].into_iter().collect(),
        );
        assert!(paths(&with).contains(&"/admin/docentes"));
        assert!(!paths(&with).contains(&"/admin/carreras"));
    }

    #[test]
    fn test_anonymous_sees_only_unrestricted_entries() {
        let ctx = AuthContext::default();
        assert_eq!(paths(&ctx), vec!["/dashboard"]);
    }
}
