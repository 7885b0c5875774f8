//! Role/permission table and route access rules.
//!
//! The table is immutable configuration: built once at first use, pure lookup
//! afterwards. Every check fails closed - an unknown resource kind or a
//! missing role grants nothing.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::models::Role;

/// Permission names a caller can ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    CanCreate,
    CanEdit,
    CanDelete,
    CanInvite,
    CanManageUsers,
    CanModerateContent,
}

/// Edit/delete scope for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// May act on any record.
    All,
    /// May act only on records the caller owns.
    Own,
}

#[derive(Debug)]
struct RolePermissions {
    can_create: &'static [&'static str],
    edit_scope: Scope,
    delete_scope: Scope,
    can_invite: bool,
    can_manage_users: bool,
    can_moderate_content: bool,
}

static PERMISSION_TABLE: Lazy<HashMap<Role, RolePermissions>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        Role::Admin,
        RolePermissions {
            can_create: &[
                "timeline",
                "event",
                "media",
                "story",
                "help_item",
                "vault_entry",
                "announcement",
                "faq",
            ],
            edit_scope: Scope::All,
            delete_scope: Scope::All,
            can_invite: true,
            can_manage_users: true,
            can_moderate_content: true,
        },
    );
    table.insert(
        Role::Family,
        RolePermissions {
            can_create: &["event", "media", "story", "help_item", "vault_entry", "comment"],
            edit_scope: Scope::Own,
            delete_scope: Scope::Own,
            can_invite: false,
            can_manage_users: false,
            can_moderate_content: false,
        },
    );
    table.insert(
        Role::Friend,
        RolePermissions {
            can_create: &["vault_entry", "comment"],
            edit_scope: Scope::Own,
            delete_scope: Scope::Own,
            can_invite: false,
            can_manage_users: false,
            can_moderate_content: false,
        },
    );
    table
});

/// Check whether `role` holds `permission`, optionally scoped to a resource
/// kind and ownership. A violated check denies the action; nothing is ever
/// partially applied.
pub fn has_permission(
    role: Option<Role>,
    permission: Permission,
    resource_kind: Option<&str>,
    is_owner: bool,
) -> bool {
    let Some(role) = role else { return false };
    let Some(perms) = PERMISSION_TABLE.get(&role) else {
        return false;
    };

    match permission {
        Permission::CanCreate => resource_kind
            .map(|kind| perms.can_create.contains(&kind))
            .unwrap_or(false),
        Permission::CanEdit => match perms.edit_scope {
            Scope::All => true,
            Scope::Own => is_owner,
        },
        Permission::CanDelete => match perms.delete_scope {
            Scope::All => true,
            Scope::Own => is_owner,
        },
        Permission::CanInvite => perms.can_invite,
        Permission::CanManageUsers => perms.can_manage_users,
        Permission::CanModerateContent => perms.can_moderate_content,
    }
}

// ============================================================================
// Route classification
// ============================================================================

/// Access tier a path belongs to. The four protected sets are disjoint;
/// anything not public defaults to requiring authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    AdminOnly,
    FamilyPlus,
    Authenticated,
}

const PUBLIC_ROUTES: &[&str] = &["/", "/login", "/signup", "/join"];
const AUTH_PAGES: &[&str] = &["/login", "/signup", "/join"];
const ADMIN_ROUTES: &[&str] = &["/admin"];
const FAMILY_ROUTES: &[&str] = &["/gallery/upload", "/help/manage"];

fn matches_any(path: &str, routes: &[&str]) -> bool {
    routes.iter().any(|route| {
        path == *route || (*route != "/" && path.starts_with(&format!("{}/", route)))
    })
}

impl RouteClass {
    pub fn classify(path: &str) -> Self {
        if matches_any(path, ADMIN_ROUTES) {
            RouteClass::AdminOnly
        } else if matches_any(path, FAMILY_ROUTES) {
            RouteClass::FamilyPlus
        } else if matches_any(path, PUBLIC_ROUTES) {
            RouteClass::Public
        } else {
            RouteClass::Authenticated
        }
    }
}

/// Is this one of the login/signup/join pages an authenticated user should be
/// bounced away from?
pub fn is_auth_page(path: &str) -> bool {
    matches_any(path, AUTH_PAGES)
}

/// The requesting identity as the guard sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestIdentity {
    Anonymous,
    /// Session present; role is `None` while the profile has not been
    /// materialized yet (incomplete identity).
    Authenticated(Option<Role>),
}

/// Guard outcome for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin { redirect_to: String },
    RedirectToDashboard,
}

/// Evaluate the guard state machine for `path`. Order matters: public first,
/// then the unauthenticated check, then authenticated-on-auth-page, then role
/// tiers, then default allow.
pub fn evaluate_route(path: &str, identity: RequestIdentity) -> RouteDecision {
    let class = RouteClass::classify(path);

    if class == RouteClass::Public {
        if matches!(identity, RequestIdentity::Authenticated(_)) && is_auth_page(path) {
            return RouteDecision::RedirectToDashboard;
        }
        return RouteDecision::Allow;
    }

    let role = match identity {
        RequestIdentity::Anonymous => {
            return RouteDecision::RedirectToLogin {
                redirect_to: path.to_string(),
            }
        }
        RequestIdentity::Authenticated(role) => role,
    };

    match class {
        RouteClass::AdminOnly if role != Some(Role::Admin) => RouteDecision::RedirectToDashboard,
        RouteClass::FamilyPlus if !role.is_some_and(|r| r.is_family_plus()) => {
            RouteDecision::RedirectToDashboard
        }
        _ => RouteDecision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_edits_everything_without_ownership() {
        for kind in ["story", "media", "faq"] {
            assert!(has_permission(
                Some(Role::Admin),
                Permission::CanEdit,
                Some(kind),
                false
            ));
        }
    }

    #[test]
    fn own_scope_requires_ownership() {
        assert!(!has_permission(
            Some(Role::Family),
            Permission::CanEdit,
            Some("story"),
            false
        ));
        assert!(has_permission(
            Some(Role::Family),
            Permission::CanEdit,
            Some("story"),
            true
        ));
        assert!(!has_permission(
            Some(Role::Friend),
            Permission::CanDelete,
            None,
            false
        ));
        assert!(has_permission(
            Some(Role::Friend),
            Permission::CanDelete,
            None,
            true
        ));
    }

    #[test]
    fn create_is_gated_by_resource_kind() {
        assert!(has_permission(
            Some(Role::Friend),
            Permission::CanCreate,
            Some("vault_entry"),
            false
        ));
        assert!(!has_permission(
            Some(Role::Friend),
            Permission::CanCreate,
            Some("announcement"),
            false
        ));
        assert!(has_permission(
            Some(Role::Family),
            Permission::CanCreate,
            Some("help_item"),
            false
        ));
        assert!(!has_permission(
            Some(Role::Family),
            Permission::CanCreate,
            Some("faq"),
            false
        ));
    }

    #[test]
    fn checks_fail_closed() {
        // No role at all.
        assert!(!has_permission(None, Permission::CanManageUsers, None, true));
        // Create without a resource kind.
        assert!(!has_permission(
            Some(Role::Admin),
            Permission::CanCreate,
            None,
            true
        ));
    }

    #[test]
    fn flag_permissions_are_direct_lookups() {
        assert!(has_permission(Some(Role::Admin), Permission::CanInvite, None, false));
        assert!(!has_permission(Some(Role::Family), Permission::CanInvite, None, false));
        assert!(has_permission(
            Some(Role::Admin),
            Permission::CanModerateContent,
            None,
            false
        ));
        assert!(!has_permission(
            Some(Role::Friend),
            Permission::CanManageUsers,
            None,
            false
        ));
    }

    #[test]
    fn route_classification() {
        assert_eq!(RouteClass::classify("/"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/login"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/join/family/abc"), RouteClass::Public);
        assert_eq!(RouteClass::classify("/admin"), RouteClass::AdminOnly);
        assert_eq!(RouteClass::classify("/admin/users"), RouteClass::AdminOnly);
        assert_eq!(
            RouteClass::classify("/gallery/upload"),
            RouteClass::FamilyPlus
        );
        assert_eq!(RouteClass::classify("/help/manage"), RouteClass::FamilyPlus);
        assert_eq!(RouteClass::classify("/dashboard"), RouteClass::Authenticated);
        // Not listed anywhere: still requires authentication.
        assert_eq!(RouteClass::classify("/vault"), RouteClass::Authenticated);
    }

    #[test]
    fn prefix_matching_is_segment_aware() {
        // "/adminx" must not inherit admin classification from "/admin".
        assert_eq!(RouteClass::classify("/adminx"), RouteClass::Authenticated);
        assert_eq!(RouteClass::classify("/loginx"), RouteClass::Authenticated);
    }

    #[test]
    fn anonymous_on_protected_redirects_to_login_with_return_path() {
        assert_eq!(
            evaluate_route("/dashboard", RequestIdentity::Anonymous),
            RouteDecision::RedirectToLogin {
                redirect_to: "/dashboard".to_string()
            }
        );
    }

    #[test]
    fn friend_on_admin_redirects_to_dashboard() {
        assert_eq!(
            evaluate_route("/admin", RequestIdentity::Authenticated(Some(Role::Friend))),
            RouteDecision::RedirectToDashboard
        );
    }

    #[test]
    fn admin_on_admin_is_allowed() {
        assert_eq!(
            evaluate_route("/admin", RequestIdentity::Authenticated(Some(Role::Admin))),
            RouteDecision::Allow
        );
    }

    #[test]
    fn family_tier() {
        assert_eq!(
            evaluate_route(
                "/gallery/upload",
                RequestIdentity::Authenticated(Some(Role::Family))
            ),
            RouteDecision::Allow
        );
        assert_eq!(
            evaluate_route(
                "/gallery/upload",
                RequestIdentity::Authenticated(Some(Role::Friend))
            ),
            RouteDecision::RedirectToDashboard
        );
    }

    #[test]
    fn authenticated_user_is_bounced_off_auth_pages() {
        assert_eq!(
            evaluate_route("/login", RequestIdentity::Authenticated(Some(Role::Friend))),
            RouteDecision::RedirectToDashboard
        );
        // But the landing page stays reachable.
        assert_eq!(
            evaluate_route("/", RequestIdentity::Authenticated(Some(Role::Friend))),
            RouteDecision::Allow
        );
    }

    #[test]
    fn incomplete_identity_cannot_reach_role_gated_routes() {
        assert_eq!(
            evaluate_route("/admin", RequestIdentity::Authenticated(None)),
            RouteDecision::RedirectToDashboard
        );
        assert_eq!(
            evaluate_route("/dashboard", RequestIdentity::Authenticated(None)),
            RouteDecision::Allow
        );
    }
}
