use std::sync::Arc;

use crate::compiler::NamespacePermissions;
use crate::key::{PermissionKey, WILDCARD};
use crate::store::{PermissionMap, PermissionStore};

/// Type alias for a shareable permission checker
pub type PermissionCheckerRef = Arc<dyn PermissionChecker>;

/// Answers "may `verb` be used on this resource in this namespace".
///
/// Informational only: the API server enforces the real decision, this is
/// what a client uses to decide which actions to offer.
pub trait PermissionChecker: Send + Sync {
    /// `resource_name` of `None` asks about every object of the resource.
    fn allows(
        &self,
        namespace: &str,
        verb: &str,
        group: &str,
        resource: &str,
        resource_name: Option<&str>,
    ) -> bool;
}

/// Checker used before any rules review is available. Denies everything.
pub struct DenyAllChecker;

impl Default for DenyAllChecker {
    fn default() -> Self {
        DenyAllChecker
    }
}

impl PermissionChecker for DenyAllChecker {
    fn allows(
        &self,
        _namespace: &str,
        _verb: &str,
        _group: &str,
        _resource: &str,
        _resource_name: Option<&str>,
    ) -> bool {
        false
    }
}

impl PermissionChecker for PermissionMap {
    fn allows(
        &self,
        namespace: &str,
        verb: &str,
        group: &str,
        resource: &str,
        resource_name: Option<&str>,
    ) -> bool {
        has_permission(self, namespace, verb, group, resource, resource_name)
    }
}

impl PermissionChecker for PermissionStore {
    fn allows(
        &self,
        namespace: &str,
        verb: &str,
        group: &str,
        resource: &str,
        resource_name: Option<&str>,
    ) -> bool {
        has_permission(&self.snapshot(), namespace, verb, group, resource, resource_name)
    }
}

/// Check `verb` on `group`/`resource` (optionally one named object) in `namespace`.
///
/// Unknown namespaces have no permissions.
#[must_use]
pub fn has_permission(
    permissions: &PermissionMap,
    namespace: &str,
    verb: &str,
    group: &str,
    resource: &str,
    resource_name: Option<&str>,
) -> bool {
    let Some(table) = permissions.namespace(namespace) else {
        return false;
    };

    has_namespace_permission(
        table,
        verb,
        group,
        resource,
        resource_name.unwrap_or(WILDCARD),
    )
}

/// Check `verb` against a single namespace's table.
///
/// Looks up the exact key first and falls back to `*:*:*` only. Narrower
/// keys already carry the verbs of the wildcard keys covering them.
#[must_use]
pub fn has_namespace_permission(
    table: &NamespacePermissions,
    verb: &str,
    group: &str,
    resource: &str,
    resource_name: &str,
) -> bool {
    let key = PermissionKey::new(group, resource, resource_name);

    table
        .get(&key)
        .or_else(|| table.get(&PermissionKey::all()))
        .is_some_and(|verbs| verbs.allows(verb))
}
