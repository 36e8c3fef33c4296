//! Rules reviews for an arbitrary subject, assembled from RBAC objects.
//!
//! A `SelfSubjectRulesReview` only describes the caller. To inspect what
//! another user or group may do, read the namespace's `Role`, `ClusterRole`
//! and `RoleBinding` objects and assemble an equivalent [`RulesReviewStatus`]
//! here. The result feeds [`compile`](crate::compile) like a server-issued
//! review.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{ResourceRule, RulesReviewStatus};

pub const ROLE_KIND: &str = "Role";
pub const CLUSTER_ROLE_KIND: &str = "ClusterRole";
pub const USER_KIND: &str = "User";
pub const GROUP_KIND: &str = "Group";

/// Role name → resource rules of that role.
pub type RoleRules = BTreeMap<String, Vec<ResourceRule>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// `rbac.authorization.k8s.io/v1` policy rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    pub verbs: Vec<String>,
    #[serde(default)]
    pub api_groups: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_names: Option<Vec<String>>,
    #[serde(
        default,
        rename = "nonResourceURLs",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub non_resource_urls: Vec<String>,
}

/// A `Role` or a `ClusterRole`; both share this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub rules: Option<Vec<PolicyRule>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    #[serde(default)]
    pub api_group: String,
    pub kind: String,
    pub name: String,
}

/// A `RoleBinding` or a `ClusterRoleBinding`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub subjects: Option<Vec<Subject>>,
    pub role_ref: RoleRef,
}

/// Rules of the roles a binding may reference, split by role kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesMaps {
    pub roles: RoleRules,
    pub cluster_roles: RoleRules,
}

impl RulesMaps {
    fn rules_for(&self, role_ref: &RoleRef) -> &[ResourceRule] {
        let rules = match role_ref.kind.as_str() {
            CLUSTER_ROLE_KIND => &self.cluster_roles,
            ROLE_KIND => &self.roles,
            _ => return &[],
        };
        rules
            .get(&role_ref.name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl From<&PolicyRule> for ResourceRule {
    fn from(rule: &PolicyRule) -> Self {
        Self {
            verbs: rule.verbs.clone(),
            api_groups: rule.api_groups.clone(),
            resources: rule.resources.clone(),
            resource_names: rule.resource_names.clone(),
        }
    }
}

/// Resource rules of each role, keyed by role name.
///
/// Rules covering only non-resource URLs are left out. A role without rules
/// maps to an empty list.
#[must_use]
pub fn role_rules(roles: &[Role]) -> RoleRules {
    roles
        .iter()
        .map(|role| {
            let rules = role
                .rules
                .iter()
                .flatten()
                .filter(|rule| !rule.resources.is_empty())
                .map(ResourceRule::from)
                .collect();
            (role.metadata.name.clone(), rules)
        })
        .collect()
}

/// [`role_rules`] for every namespace. Cluster roles go under `""`.
#[must_use]
pub fn role_rules_by_namespace(roles: &BTreeMap<String, Vec<Role>>) -> BTreeMap<String, RoleRules> {
    roles
        .iter()
        .map(|(namespace, roles)| (namespace.clone(), role_rules(roles)))
        .collect()
}

fn binds_subject<S: AsRef<str>>(binding: &RoleBinding, user: Option<&str>, groups: &[S]) -> bool {
    binding.subjects.iter().flatten().any(|subject| match subject.kind.as_str() {
        USER_KIND => user.is_some_and(|user| user == subject.name),
        GROUP_KIND => groups.iter().any(|group| group.as_ref() == subject.name),
        _ => false,
    })
}

/// Complete rules review for `user` and `groups`, built from `bindings`.
///
/// Rules of a role are added once, in the order of the first binding that
/// references it. Roles missing from `rules` grant nothing. Service account
/// subjects are never matched.
#[must_use]
pub fn rules_review_from_bindings<S: AsRef<str>>(
    bindings: &[RoleBinding],
    rules: &RulesMaps,
    user: Option<&str>,
    groups: &[S],
) -> RulesReviewStatus {
    let mut seen: HashSet<&RoleRef> = HashSet::new();
    let mut resource_rules = Vec::new();

    for binding in bindings {
        if !binds_subject(binding, user, groups) || !seen.insert(&binding.role_ref) {
            continue;
        }
        resource_rules.extend_from_slice(rules.rules_for(&binding.role_ref));
    }

    tracing::debug!(
        user = user.unwrap_or_default(),
        groups = groups.len(),
        roles = seen.len(),
        rules = resource_rules.len(),
        "rules review assembled from bindings"
    );

    RulesReviewStatus::complete(resource_rules)
}
