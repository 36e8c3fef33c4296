//! Coarse access checks built on top of the permission map.

use crate::query::has_permission;
use crate::store::PermissionMap;
use crate::use_cases::Organization;

/// Group of the resource whose visibility decides access to the dashboard.
pub const APP_ACCESS_GROUP: &str = "cluster.x-k8s.io";
pub const APP_ACCESS_RESOURCE: &str = "clusters";

/// How the current user authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Permissions come from Kubernetes rules reviews.
    Kubernetes,
    /// Permissions are not derived from rules reviews; nothing is gated.
    Legacy,
}

/// `true` if clusters can be listed or read in `namespace`.
#[must_use]
pub fn has_app_access_in_namespace(permissions: &PermissionMap, namespace: &str) -> bool {
    ["list", "get"].into_iter().any(|verb| {
        has_permission(
            permissions,
            namespace,
            verb,
            APP_ACCESS_GROUP,
            APP_ACCESS_RESOURCE,
            None,
        )
    })
}

/// `true` if the user may use the application at all.
///
/// Kubernetes sessions need app access in at least one namespace; without a
/// computed map they have none.
#[must_use]
pub fn has_app_access(kind: SessionKind, permissions: Option<&PermissionMap>) -> bool {
    if kind == SessionKind::Legacy {
        return true;
    }

    permissions.is_some_and(|permissions| {
        permissions
            .namespaces()
            .any(|ns| has_app_access_in_namespace(permissions, ns))
    })
}

/// `true` if `admin_group` is one of the user's groups.
#[must_use]
pub fn is_admin<S: AsRef<str>>(groups: &[S], admin_group: &str) -> bool {
    !admin_group.is_empty() && groups.iter().any(|group| group.as_ref() == admin_group)
}

/// Namespaces to request rules reviews for.
///
/// Organization namespaces come first, followed by `extra` (namespaces that
/// hold resources without belonging to an organization). Duplicates are
/// dropped, order is preserved.
#[must_use]
pub fn review_namespaces<S: AsRef<str>>(organizations: &[Organization], extra: &[S]) -> Vec<String> {
    let mut namespaces: Vec<String> = Vec::with_capacity(organizations.len() + extra.len());

    let org_namespaces = organizations.iter().filter_map(|org| {
        if org.namespace.is_none() {
            tracing::debug!(organization = %org.id, "organization has no namespace");
        }
        org.namespace.as_deref()
    });

    let extra = extra.iter().map(AsRef::<str>::as_ref);

    for namespace in org_namespaces.chain(extra) {
        if !namespaces.iter().any(|known| known == namespace) {
            namespaces.push(namespace.to_owned());
        }
    }

    namespaces
}

/// Cache key for a batch of single-resource access reviews.
#[must_use]
pub fn access_review_cache_key<S: AsRef<str>>(
    namespace: &str,
    verbs: &[S],
    group: &str,
    resource: &str,
) -> String {
    let verbs = verbs.iter().map(AsRef::<str>::as_ref).collect::<Vec<_>>().join(",");
    format!("getAccessForResource/{namespace}/{verbs}/{group}/{resource}")
}
