//! Aggregation of compiled namespaces and the swappable snapshot holder.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use arc_swap::ArcSwap;
use xxhash_rust::xxh3::Xxh3;

use crate::compiler::{NamespacePermissions, compile};
use crate::ingest::ingest;
use crate::models::{RulesReviewStatus, SelfSubjectRulesReview};

/// Compiled permissions of every namespace the subject was reviewed in.
///
/// A namespace missing from the map has no permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PermissionMap {
    namespaces: HashMap<String, NamespacePermissions>,
}

impl PermissionMap {
    #[must_use]
    pub fn namespace(&self, namespace: &str) -> Option<&NamespacePermissions> {
        self.namespaces.get(namespace)
    }

    #[must_use]
    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

impl FromIterator<(String, NamespacePermissions)> for PermissionMap {
    fn from_iter<I: IntoIterator<Item = (String, NamespacePermissions)>>(iter: I) -> Self {
        Self {
            namespaces: iter.into_iter().collect(),
        }
    }
}

/// Build the permission map from one rules review per namespace.
///
/// Incomplete reviews leave their namespace out. When a namespace occurs
/// more than once, the last review wins.
#[must_use]
pub fn build<'a, I>(reviews: I) -> PermissionMap
where
    I: IntoIterator<Item = (&'a str, &'a RulesReviewStatus)>,
{
    let mut namespaces = HashMap::new();

    for (namespace, review) in reviews {
        match ingest(namespace, review) {
            Some(rules) => {
                namespaces.insert(namespace.to_owned(), compile(rules));
            }
            None => {
                namespaces.remove(namespace);
            }
        }
    }

    tracing::debug!(namespaces = namespaces.len(), "permission map built");
    PermissionMap { namespaces }
}

/// Same as [`build`] over full API envelopes. Reviews without a status are
/// treated as incomplete.
#[must_use]
pub fn compute_permissions<'a, I>(reviews: I) -> PermissionMap
where
    I: IntoIterator<Item = (&'a str, &'a SelfSubjectRulesReview)>,
{
    let incomplete = RulesReviewStatus::incomplete("rules review has no status");
    build(
        reviews
            .into_iter()
            .map(|(namespace, review)| (namespace, review.status.as_ref().unwrap_or(&incomplete))),
    )
}

/// Keep the reviews that were fetched, dropping failed requests.
///
/// Mirrors an "all settled" fan-out: one failing namespace never prevents the
/// others from being compiled, and a failed namespace simply has no permissions.
#[must_use]
pub fn collect_settled<I, E>(results: I) -> Vec<(String, SelfSubjectRulesReview)>
where
    I: IntoIterator<Item = (String, Result<SelfSubjectRulesReview, E>)>,
    E: Display,
{
    results
        .into_iter()
        .filter_map(|(namespace, result)| match result {
            Ok(review) => Some((namespace, review)),
            Err(err) => {
                tracing::warn!(namespace = %namespace, error = %err, "rules review request failed");
                None
            }
        })
        .collect()
}

struct Snapshot {
    map: Arc<PermissionMap>,
    fingerprint: Option<u64>,
}

/// Holder of the current [`PermissionMap`].
///
/// Readers take lock-free snapshots; a single writer rebuilds the map from a
/// fresh input set and swaps it in atomically. Readers keep using the
/// previous snapshot until the swap.
pub struct PermissionStore {
    current: ArcSwap<Snapshot>,
}

impl Default for PermissionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot {
                map: Arc::new(PermissionMap::default()),
                fingerprint: None,
            }),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<PermissionMap> {
        Arc::clone(&self.current.load().map)
    }

    /// Compile `reviews` and replace the current map.
    pub fn rebuild(&self, reviews: &[(String, RulesReviewStatus)]) -> Arc<PermissionMap> {
        self.swap_in(reviews, fingerprint(reviews))
    }

    /// Like [`rebuild`](Self::rebuild), but skips compilation when `reviews`
    /// are identical to the input of the current map.
    ///
    /// Returns `true` if the map was replaced.
    pub fn rebuild_if_changed(&self, reviews: &[(String, RulesReviewStatus)]) -> bool {
        let fingerprint = fingerprint(reviews);
        if fingerprint.is_some() && fingerprint == self.current.load().fingerprint {
            tracing::debug!("rules reviews unchanged, keeping permission map");
            return false;
        }

        self.swap_in(reviews, fingerprint);
        true
    }

    fn swap_in(
        &self,
        reviews: &[(String, RulesReviewStatus)],
        fingerprint: Option<u64>,
    ) -> Arc<PermissionMap> {
        let map = Arc::new(build(
            reviews
                .iter()
                .map(|(namespace, review)| (namespace.as_str(), review)),
        ));
        self.current.store(Arc::new(Snapshot {
            map: Arc::clone(&map),
            fingerprint,
        }));
        map
    }
}

/// Stable hash of the input set, independent of namespace order.
fn fingerprint(reviews: &[(String, RulesReviewStatus)]) -> Option<u64> {
    let mut ordered: Vec<&(String, RulesReviewStatus)> = reviews.iter().collect();
    // Stable sort: duplicates keep their relative order, which decides the winner.
    ordered.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Xxh3::new();
    for entry in ordered {
        match serde_json::to_vec(entry) {
            Ok(bytes) => hasher.update(&bytes),
            Err(err) => {
                tracing::warn!(error = %err, "cannot fingerprint rules review");
                return None;
            }
        }
    }
    Some(hasher.digest())
}
