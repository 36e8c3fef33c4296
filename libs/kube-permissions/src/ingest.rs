use crate::models::{ResourceRule, RulesReviewStatus};

/// Resource rules of `review` that may be compiled for `namespace`.
///
/// An incomplete review yields `None`: a partially evaluated review never
/// grants anything, so the namespace is left out of the permission map.
/// Non-resource rules and the evaluation error are not inspected.
#[must_use]
pub fn ingest<'a>(namespace: &str, review: &'a RulesReviewStatus) -> Option<&'a [ResourceRule]> {
    if review.incomplete {
        tracing::debug!(
            namespace,
            evaluation_error = review.evaluation_error.as_deref().unwrap_or_default(),
            "skipping incomplete rules review"
        );
        return None;
    }

    Some(&review.resource_rules)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn incomplete_review_is_dropped() {
        let mut review = RulesReviewStatus::incomplete("webhook timed out");
        review
            .resource_rules
            .push(ResourceRule::new(&["*"], &["*"], &["*"]));

        assert!(ingest("org-acme", &review).is_none());
        assert!(logs_contain("skipping incomplete rules review"));
        assert!(logs_contain("org-acme"));
    }

    #[test]
    fn complete_review_passes_rules_through() {
        let rules = vec![
            ResourceRule::new(&[""], &["pods"], &["get"]),
            ResourceRule::new(&["apps"], &["deployments"], &["list"]),
        ];
        let review = RulesReviewStatus::complete(rules.clone());

        assert_eq!(ingest("org-acme", &review), Some(rules.as_slice()));
    }
}
