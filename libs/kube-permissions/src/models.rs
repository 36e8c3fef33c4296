//! Wire types of the `authorization.k8s.io/v1` rules-review API.
//!
//! Only the fields the permission compiler reads are modelled strictly;
//! everything else is carried so a review can be passed through untouched.

use serde::{Deserialize, Serialize};

pub const RULES_REVIEW_API_VERSION: &str = "authorization.k8s.io/v1";
pub const RULES_REVIEW_KIND: &str = "SelfSubjectRulesReview";

/// One granted capability statement.
///
/// List order is significant: the compiler stops reading `resources`
/// at the first `"*"` it meets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRule {
    pub verbs: Vec<String>,
    #[serde(default)]
    pub api_groups: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_names: Option<Vec<String>>,
}

impl ResourceRule {
    /// Convenience constructor for a rule without resource names.
    #[must_use]
    pub fn new(api_groups: &[&str], resources: &[&str], verbs: &[&str]) -> Self {
        Self {
            verbs: to_owned_vec(verbs),
            api_groups: to_owned_vec(api_groups),
            resources: to_owned_vec(resources),
            resource_names: None,
        }
    }

    #[must_use]
    pub fn with_resource_names(mut self, names: &[&str]) -> Self {
        self.resource_names = Some(to_owned_vec(names));
        self
    }
}

/// Rule over non-resource URLs. Ignored by the compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonResourceRule {
    pub verbs: Vec<String>,
    #[serde(default, rename = "nonResourceURLs")]
    pub non_resource_urls: Vec<String>,
}

/// Result of asking "what can the current subject do in this namespace".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesReviewStatus {
    #[serde(default)]
    pub resource_rules: Vec<ResourceRule>,
    #[serde(default)]
    pub non_resource_rules: Vec<NonResourceRule>,
    pub incomplete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_error: Option<String>,
}

impl RulesReviewStatus {
    /// A complete review granting the given rules.
    #[must_use]
    pub fn complete(resource_rules: Vec<ResourceRule>) -> Self {
        Self {
            resource_rules,
            ..Self::default()
        }
    }

    /// A review the server could not fully evaluate.
    #[must_use]
    pub fn incomplete(evaluation_error: impl Into<String>) -> Self {
        Self {
            incomplete: true,
            evaluation_error: Some(evaluation_error.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfSubjectRulesReviewSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Full API envelope as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfSubjectRulesReview {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub spec: SelfSubjectRulesReviewSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RulesReviewStatus>,
}

impl SelfSubjectRulesReview {
    /// Request body for a review of `namespace`.
    #[must_use]
    pub fn request(namespace: &str) -> Self {
        Self {
            api_version: RULES_REVIEW_API_VERSION.to_owned(),
            kind: RULES_REVIEW_KIND.to_owned(),
            spec: SelfSubjectRulesReviewSpec {
                namespace: Some(namespace.to_owned()),
            },
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: RulesReviewStatus) -> Self {
        self.status = Some(status);
        self
    }
}

fn to_owned_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn deserializes_api_response() {
        let json = r#"{
            "apiVersion": "authorization.k8s.io/v1",
            "kind": "SelfSubjectRulesReview",
            "spec": {"namespace": "org-acme"},
            "status": {
                "resourceRules": [
                    {"verbs": ["get"], "apiGroups": [""], "resources": ["pods"]},
                    {"verbs": ["patch"], "apiGroups": ["apps"], "resources": ["deployments"], "resourceNames": ["web"]}
                ],
                "nonResourceRules": [
                    {"verbs": ["get"], "nonResourceURLs": ["/healthz"]}
                ],
                "incomplete": false
            }
        }"#;

        let review: SelfSubjectRulesReview = serde_json::from_str(json).unwrap();
        assert_eq!(review.spec.namespace.as_deref(), Some("org-acme"));

        let status = review.status.unwrap();
        assert!(!status.incomplete);
        assert_eq!(status.evaluation_error, None);
        assert_eq!(status.resource_rules.len(), 2);
        assert_eq!(
            status.resource_rules[1].resource_names.as_deref(),
            Some(&["web".to_owned()][..])
        );
        assert_eq!(status.non_resource_rules[0].non_resource_urls, ["/healthz"]);
    }

    #[test]
    fn missing_optional_lists_default_to_empty() {
        let json = r#"{"resourceRules": [{"verbs": ["*"]}], "incomplete": true, "evaluationError": "boom"}"#;
        let status: RulesReviewStatus = serde_json::from_str(json).unwrap();

        assert!(status.incomplete);
        assert_eq!(status.evaluation_error.as_deref(), Some("boom"));
        assert!(status.resource_rules[0].api_groups.is_empty());
        assert!(status.resource_rules[0].resource_names.is_none());
        assert!(status.non_resource_rules.is_empty());
    }

    #[test]
    fn request_has_no_status() {
        let request = SelfSubjectRulesReview::request("default");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["apiVersion"], RULES_REVIEW_API_VERSION);
        assert_eq!(json["kind"], RULES_REVIEW_KIND);
        assert_eq!(json["spec"]["namespace"], "default");
        assert!(json.get("status").is_none());
    }
}
