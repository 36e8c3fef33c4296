//! Named permission bundles ("use cases") evaluated against a permission map.
//!
//! A use case such as "Inspect clusters" lists the verbs, resources and
//! groups a user needs for a task. Its status in an organization is `true`
//! only when every combination is allowed there.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::UseCaseError;
use crate::query::has_permission;
use crate::store::PermissionMap;

/// Namespace holding resources shared by every organization.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Namespace used for cluster-scoped permissions.
pub const CLUSTER_SCOPE_NAMESPACE: &str = "";

/// Status key used for use cases that are not tied to an organization.
pub const GLOBAL_STATUS_KEY: &str = "";

/// Use-case name → organization id → granted.
pub type UseCaseStatuses = BTreeMap<String, BTreeMap<String, bool>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCaseScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseCasePermission {
    pub api_groups: Vec<String>,
    pub resources: Vec<String>,
    pub verbs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsUseCase {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scope: UseCaseScope,
    pub permissions: Vec<UseCasePermission>,
}

/// An organization whose namespace use cases are checked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Organization {
    #[must_use]
    pub fn new(id: &str, namespace: &str) -> Self {
        Self {
            id: id.to_owned(),
            namespace: Some(namespace.to_owned()),
        }
    }
}

/// Provider name → resources that only exist on that provider.
///
/// A resource listed under no provider is checked everywhere. A listed
/// resource is only checked on the providers listing it, so an Azure
/// installation never asks for `awsclusters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderResources(BTreeMap<String, BTreeSet<String>>);

impl ProviderResources {
    /// Restrict checks to the resources relevant on `provider`.
    #[must_use]
    pub fn for_provider<'a>(&'a self, provider: &'a str) -> ProviderFilter<'a> {
        ProviderFilter {
            provider,
            catalog: self,
        }
    }

    #[must_use]
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<P, R, S> FromIterator<(P, R)> for ProviderResources
where
    P: Into<String>,
    R: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, R)>>(iter: I) -> Self {
        let mut catalog: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (provider, resources) in iter {
            catalog
                .entry(provider.into())
                .or_default()
                .extend(resources.into_iter().map(Into::into));
        }
        Self(catalog)
    }
}

/// [`ProviderResources`] bound to the provider of this installation.
#[derive(Debug, Clone, Copy)]
pub struct ProviderFilter<'a> {
    provider: &'a str,
    catalog: &'a ProviderResources,
}

impl ProviderFilter<'_> {
    #[must_use]
    pub fn provider(&self) -> &str {
        self.provider
    }

    /// `true` if `resource` is checked on this provider.
    #[must_use]
    pub fn applies(&self, resource: &str) -> bool {
        let catalog = &self.catalog.0;
        catalog
            .get(self.provider)
            .is_some_and(|own| own.contains(resource))
            || !catalog.values().any(|resources| resources.contains(resource))
    }
}

/// One `(verb, resource, api_group)` combination to check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTriple {
    pub verb: String,
    pub resource: String,
    pub api_group: String,
}

impl PermissionsUseCase {
    /// Parse a JSON array of use cases.
    ///
    /// # Errors
    ///
    /// Returns [`UseCaseError::InvalidJson`] if `json` is not a valid use-case list.
    pub fn parse_list(json: &str) -> Result<Vec<PermissionsUseCase>, UseCaseError> {
        Ok(serde_json::from_str(json)?)
    }

    /// `true` for use cases checked once for the whole installation rather
    /// than per organization.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.scope.cluster == Some(true)
            || self
                .scope
                .namespaces
                .as_ref()
                .and_then(|namespaces| namespaces.first())
                .is_some_and(|ns| ns == DEFAULT_NAMESPACE)
    }

    /// Namespace a global use case is checked in.
    fn global_namespace(&self) -> &'static str {
        if self.scope.cluster == Some(true) {
            CLUSTER_SCOPE_NAMESPACE
        } else {
            DEFAULT_NAMESPACE
        }
    }
}

/// Expand permission entries into every verb × resource × group combination.
///
/// Entries keep their order; within an entry verbs vary slowest and groups fastest.
#[must_use]
pub fn permission_cartesians(permissions: &[UseCasePermission]) -> Vec<PermissionTriple> {
    permissions
        .iter()
        .flat_map(|permission| {
            permission.verbs.iter().flat_map(move |verb| {
                permission.resources.iter().flat_map(move |resource| {
                    permission
                        .api_groups
                        .iter()
                        .map(move |api_group| PermissionTriple {
                            verb: verb.clone(),
                            resource: resource.clone(),
                            api_group: api_group.clone(),
                        })
                })
            })
        })
        .collect()
}

fn all_granted(permissions: &PermissionMap, namespace: &str, triples: &[PermissionTriple]) -> bool {
    triples.iter().all(|t| {
        has_permission(
            permissions,
            namespace,
            &t.verb,
            &t.api_group,
            &t.resource,
            None,
        )
    })
}

/// Status of every use case, per organization.
///
/// Global use cases get a single entry under [`GLOBAL_STATUS_KEY`]. Other use
/// cases get one entry per organization; an organization without a namespace
/// is never granted anything. With a `provider`, resources that do not exist
/// on it are left out of the check.
#[must_use]
pub fn statuses_for_use_cases(
    permissions: &PermissionMap,
    use_cases: &[PermissionsUseCase],
    provider: Option<ProviderFilter<'_>>,
    organizations: &[Organization],
) -> UseCaseStatuses {
    use_cases
        .iter()
        .map(|use_case| {
            let triples: Vec<PermissionTriple> = permission_cartesians(&use_case.permissions)
                .into_iter()
                .filter(|t| provider.is_none_or(|p| p.applies(&t.resource)))
                .collect();

            let statuses: BTreeMap<String, bool> = if use_case.is_global() {
                let granted = all_granted(permissions, use_case.global_namespace(), &triples);
                BTreeMap::from([(GLOBAL_STATUS_KEY.to_owned(), granted)])
            } else {
                organizations
                    .iter()
                    .map(|org| {
                        let granted = org
                            .namespace
                            .as_deref()
                            .is_some_and(|ns| all_granted(permissions, ns, &triples));
                        (org.id.clone(), granted)
                    })
                    .collect()
            };

            (use_case.name.clone(), statuses)
        })
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::compiler::NamespacePermissions;
    use crate::key::PermissionKey;
    use crate::verbs::VerbSet;

    const USE_CASES_JSON: &str = r#"[
        {
            "name": "Inspect namespaces",
            "category": "access control",
            "description": "List namespaces and get an individual namespace's details",
            "scope": {"cluster": true},
            "permissions": [
                {"apiGroups": [""], "resources": ["namespaces"], "verbs": ["get", "list"]}
            ]
        },
        {
            "name": "Inspect shared app catalogs",
            "category": "app catalogs",
            "description": "Read catalogs and their entries in the default namespace",
            "scope": {"namespaces": ["default"]},
            "permissions": [
                {"apiGroups": ["application.giantswarm.io"], "resources": ["catalogs", "appcatalogentries"], "verbs": ["get", "list"]}
            ]
        },
        {
            "name": "Inspect clusters",
            "category": "workload clusters",
            "description": "Read resources that form workload clusters",
            "scope": {"namespaces": ["*"]},
            "permissions": [
                {"apiGroups": ["cluster.x-k8s.io"], "resources": ["clusters"], "verbs": ["get", "list"]},
                {"apiGroups": ["infrastructure.cluster.x-k8s.io"], "resources": ["azureclusters", "azuremachines"], "verbs": ["get", "list"]},
                {"apiGroups": ["infrastructure.giantswarm.io"], "resources": ["awsclusters", "awscontrolplanes", "g8scontrolplanes"], "verbs": ["get", "list"]}
            ]
        }
    ]"#;

    fn use_case_permission(groups: &[&str], resources: &[&str], verbs: &[&str]) -> UseCasePermission {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_owned()).collect();
        UseCasePermission {
            api_groups: owned(groups),
            resources: owned(resources),
            verbs: owned(verbs),
        }
    }

    fn triple(verb: &str, resource: &str, api_group: &str) -> PermissionTriple {
        PermissionTriple {
            verb: verb.to_owned(),
            resource: resource.to_owned(),
            api_group: api_group.to_owned(),
        }
    }

    fn map(entries: &[(&str, NamespacePermissions)]) -> PermissionMap {
        entries
            .iter()
            .map(|(ns, table)| ((*ns).to_owned(), table.clone()))
            .collect()
    }

    #[test]
    fn cartesians_keep_entry_order() {
        let triples = permission_cartesians(&[
            use_case_permission(&["frogs.k8s.io"], &["apps"], &["get", "list"]),
            use_case_permission(
                &["cats.k8s.io"],
                &["catalogs", "appcatalogentries"],
                &["create", "get"],
            ),
        ]);

        assert_eq!(
            triples,
            vec![
                triple("get", "apps", "frogs.k8s.io"),
                triple("list", "apps", "frogs.k8s.io"),
                triple("create", "catalogs", "cats.k8s.io"),
                triple("create", "appcatalogentries", "cats.k8s.io"),
                triple("get", "catalogs", "cats.k8s.io"),
                triple("get", "appcatalogentries", "cats.k8s.io"),
            ]
        );
    }

    #[test]
    fn global_scope_detection() {
        let use_cases = PermissionsUseCase::parse_list(USE_CASES_JSON).unwrap();

        assert!(use_cases[0].is_global());
        assert!(use_cases[1].is_global());
        assert!(!use_cases[2].is_global());
        assert!(!PermissionsUseCase::default().is_global());
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = PermissionsUseCase::parse_list(r#"[{"name": 1}]"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid permissions use cases"));
    }

    #[test]
    fn statuses_per_organization() {
        let use_cases = PermissionsUseCase::parse_list(USE_CASES_JSON).unwrap();
        let permissions = map(&[
            ("org-test1", NamespacePermissions::default()),
            ("org-test2", NamespacePermissions::total_access()),
            ("default", NamespacePermissions::total_access()),
        ]);
        let organizations = [
            Organization::new("test1", "org-test1"),
            Organization::new("test2", "org-test2"),
        ];

        let statuses = statuses_for_use_cases(&permissions, &use_cases, None, &organizations);

        assert_eq!(statuses["Inspect namespaces"], BTreeMap::from([(String::new(), false)]));
        assert_eq!(
            statuses["Inspect shared app catalogs"],
            BTreeMap::from([(String::new(), true)])
        );
        assert_eq!(
            statuses["Inspect clusters"],
            BTreeMap::from([("test1".to_owned(), false), ("test2".to_owned(), true)])
        );
    }

    #[test]
    fn cluster_scope_uses_the_empty_namespace() {
        let use_cases = PermissionsUseCase::parse_list(USE_CASES_JSON).unwrap();
        let permissions = map(&[
            ("default", NamespacePermissions::total_access()),
            ("", NamespacePermissions::total_access()),
        ]);

        let statuses = statuses_for_use_cases(&permissions, &use_cases, None, &[]);

        assert!(statuses["Inspect namespaces"][""]);
        assert!(statuses["Inspect clusters"].is_empty());
    }

    #[test]
    fn partial_grant_is_not_enough() {
        let use_cases = PermissionsUseCase::parse_list(USE_CASES_JSON).unwrap();
        let table: NamespacePermissions = [
            (
                PermissionKey::resource("cluster.x-k8s.io", "clusters"),
                VerbSet::All,
            ),
            (
                PermissionKey::resource("infrastructure.cluster.x-k8s.io", "azureclusters"),
                VerbSet::All,
            ),
        ]
        .into_iter()
        .collect();
        let permissions = map(&[("org-a", table)]);
        let organizations = [
            Organization::new("a", "org-a"),
            Organization {
                id: "b".to_owned(),
                namespace: None,
            },
        ];

        let statuses = statuses_for_use_cases(&permissions, &use_cases, None, &organizations);

        assert!(!statuses["Inspect clusters"]["a"]);
        assert!(!statuses["Inspect clusters"]["b"]);
    }

    fn provider_resources() -> ProviderResources {
        [
            ("aws", vec!["awsclusters", "awscontrolplanes", "g8scontrolplanes"]),
            ("azure", vec!["azureclusters", "azuremachines"]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn provider_filter_keeps_shared_and_own_resources() {
        let catalog = provider_resources();
        let azure = catalog.for_provider("azure");

        assert!(azure.applies("clusters"));
        assert!(azure.applies("azureclusters"));
        assert!(!azure.applies("awsclusters"));

        let unknown = catalog.for_provider("kvm");
        assert!(unknown.applies("clusters"));
        assert!(!unknown.applies("azuremachines"));
        assert_eq!(catalog.providers().collect::<Vec<_>>(), ["aws", "azure"]);
    }

    #[test]
    fn resources_of_other_providers_are_not_checked() {
        let use_cases = PermissionsUseCase::parse_list(USE_CASES_JSON).unwrap();
        let azure_table: NamespacePermissions = [
            PermissionKey::resource("cluster.x-k8s.io", "clusters"),
            PermissionKey::resource("infrastructure.cluster.x-k8s.io", "azureclusters"),
            PermissionKey::resource("infrastructure.cluster.x-k8s.io", "azuremachines"),
        ]
        .into_iter()
        .map(|key| (key, VerbSet::All))
        .collect();
        let permissions = map(&[
            ("org-test1", NamespacePermissions::default()),
            ("org-test2", azure_table),
            ("default", NamespacePermissions::total_access()),
        ]);
        let organizations = [
            Organization::new("test1", "org-test1"),
            Organization::new("test2", "org-test2"),
        ];
        let catalog = provider_resources();

        let statuses = statuses_for_use_cases(
            &permissions,
            &use_cases,
            Some(catalog.for_provider("azure")),
            &organizations,
        );

        assert_eq!(statuses["Inspect namespaces"], BTreeMap::from([(String::new(), false)]));
        assert_eq!(
            statuses["Inspect shared app catalogs"],
            BTreeMap::from([(String::new(), true)])
        );
        assert_eq!(
            statuses["Inspect clusters"],
            BTreeMap::from([("test1".to_owned(), false), ("test2".to_owned(), true)])
        );

        let unfiltered = statuses_for_use_cases(&permissions, &use_cases, None, &organizations);
        assert!(!unfiltered["Inspect clusters"]["test2"]);
    }
}
