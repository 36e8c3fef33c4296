//! Compiles resource rules into a per-namespace permission table.
//!
//! Every rule is expanded into one [`PermissionKey`] per group, resource and
//! resource name, verbs of equal keys are merged, and finally the verbs of
//! wildcard keys are pushed down into the narrower keys they cover so that a
//! lookup never has to widen beyond a single `*:*:*` fallback.

use std::collections::HashMap;

use crate::key::{PermissionKey, WILDCARD};
use crate::models::ResourceRule;
use crate::verbs::VerbSet;

/// Compiled permissions of one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NamespacePermissions {
    entries: HashMap<PermissionKey, VerbSet>,
}

impl NamespacePermissions {
    #[must_use]
    pub fn get(&self, key: &PermissionKey) -> Option<&VerbSet> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &PermissionKey) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PermissionKey, &VerbSet)> {
        self.entries.iter()
    }

    /// Table granting every verb on everything.
    #[must_use]
    pub fn total_access() -> Self {
        Self {
            entries: HashMap::from([(PermissionKey::all(), VerbSet::All)]),
        }
    }

    fn grants_everything(&self) -> bool {
        self.get(&PermissionKey::all()).is_some_and(VerbSet::is_all)
    }
}

impl FromIterator<(PermissionKey, VerbSet)> for NamespacePermissions {
    /// Equal keys are merged rather than overwritten. No push-down is applied.
    fn from_iter<I: IntoIterator<Item = (PermissionKey, VerbSet)>>(iter: I) -> Self {
        let mut builder = TableBuilder::default();
        for (key, verbs) in iter {
            builder.merge(key, &verbs);
        }
        builder.finish()
    }
}

#[derive(Default)]
struct TableBuilder {
    entries: HashMap<PermissionKey, VerbSet>,
}

impl TableBuilder {
    fn merge(&mut self, key: PermissionKey, verbs: &VerbSet) {
        let merged = match self.entries.get(&key) {
            Some(existing) => existing.union(verbs),
            None => verbs.clone(),
        };
        self.entries.insert(key, merged);
    }

    fn finish(self) -> NamespacePermissions {
        NamespacePermissions {
            entries: self.entries,
        }
    }
}

/// Compile the resource rules of one namespace.
#[must_use]
pub fn compile(rules: &[ResourceRule]) -> NamespacePermissions {
    let mut builder = TableBuilder::default();

    for rule in rules {
        let verbs = VerbSet::from_verbs(&rule.verbs);

        for group in &rule.api_groups {
            for resource in &rule.resources {
                // A wildcard resource covers the whole group: resource names and
                // the remaining resources of this rule are not looked at.
                if resource == WILDCARD {
                    builder.merge(PermissionKey::group(group), &verbs);
                    break;
                }

                match rule.resource_names.as_deref() {
                    Some(names) if !names.is_empty() => {
                        for name in names {
                            builder.merge(PermissionKey::new(group, resource, name), &verbs);
                        }
                    }
                    _ => builder.merge(PermissionKey::resource(group, resource), &verbs),
                }
            }
        }
    }

    optimize(&builder.finish())
}

/// Push the verbs of wildcard keys down into the narrower keys they cover.
///
/// Broader verbs are read from `table` as given, so the outcome does not
/// depend on iteration order. A table granting everything on `*:*:*`
/// collapses to that single entry.
#[must_use]
pub fn optimize(table: &NamespacePermissions) -> NamespacePermissions {
    if table.grants_everything() {
        return NamespacePermissions::total_access();
    }

    let entries = table
        .iter()
        .map(|(key, verbs)| {
            let widened = key
                .broader_keys()
                .iter()
                .filter_map(|broader| table.get(broader))
                .fold(verbs.clone(), |acc, broader| acc.union(broader));
            (key.clone(), widened)
        })
        .collect();

    NamespacePermissions { entries }
}
