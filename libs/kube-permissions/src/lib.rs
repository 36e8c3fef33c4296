#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Permission computation from Kubernetes `SelfSubjectRulesReview` results.
//!
//! Rules reviews flow one way through this crate:
//!
//! - [`ingest`] drops incomplete reviews (fail-closed)
//! - [`rules_review_from_bindings`] assembles a review for another subject
//! - [`compile`] turns resource rules into a [`NamespacePermissions`] table
//! - [`build`] / [`PermissionStore`] aggregate tables into a [`PermissionMap`]
//! - [`has_permission`] answers point lookups against the map
//!
//! The result only tells a client which actions to offer; the API server
//! still enforces every request.

pub mod access;
pub mod bindings;
pub mod compiler;
pub mod config;
pub mod error;
pub mod ingest;
pub mod key;
pub mod models;
pub mod query;
pub mod store;
pub mod use_cases;
pub mod verbs;

pub use access::{SessionKind, has_app_access, has_app_access_in_namespace, is_admin};
pub use bindings::{
    Role, RoleBinding, RulesMaps, role_rules, role_rules_by_namespace, rules_review_from_bindings,
};
pub use compiler::{NamespacePermissions, compile, optimize};
pub use config::PermissionsConfig;
pub use error::{ConfigError, UseCaseError};
pub use ingest::ingest;
pub use key::{PermissionKey, WILDCARD};
pub use models::{NonResourceRule, ResourceRule, RulesReviewStatus, SelfSubjectRulesReview};
pub use query::{
    DenyAllChecker, PermissionChecker, PermissionCheckerRef, has_namespace_permission,
    has_permission,
};
pub use store::{PermissionMap, PermissionStore, build, collect_settled, compute_permissions};
pub use use_cases::{
    Organization, PermissionsUseCase, ProviderFilter, ProviderResources, UseCaseStatuses,
    statuses_for_use_cases,
};
pub use verbs::VerbSet;
