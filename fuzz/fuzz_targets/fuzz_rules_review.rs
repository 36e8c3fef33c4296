#![no_main]

use kube_permissions::{
    NamespacePermissions, PermissionKey, RulesReviewStatus, build, has_permission,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Limit input size to keep the resource-name expansion small
    if data.len() > 4096 {
        return;
    }
    let Ok(review) = serde_json::from_slice::<RulesReviewStatus>(data) else {
        return;
    };

    let map = build([("ns", &review)]);
    let Some(table) = map.namespace("ns") else {
        assert!(review.incomplete);
        return;
    };

    if table.get(&PermissionKey::all()).is_some_and(|verbs| verbs.is_all()) {
        assert_eq!(table.len(), 1);
    }

    // Serialized tables must not merge distinct keys
    if let Ok(json) = serde_json::to_string(table) {
        let parsed: NamespacePermissions =
            serde_json::from_str(&json).unwrap_or_else(|e| panic!("{e}: {json}"));
        assert_eq!(&parsed, table);
    }

    for (key, verbs) in table.iter() {
        for broader in key.broader_keys() {
            if let Some(wider) = table.get(&broader) {
                assert!(verbs.is_superset(wider));
            }
        }
        let _ = has_permission(
            &map,
            "ns",
            "get",
            key.api_group(),
            key.resource_type(),
            Some(key.resource_name()),
        );
    }
});
