#![no_main]

use figment::Figment;
use figment::providers::{Format, Yaml};
use kube_permissions::PermissionsConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are expected, panics are not
        let _ = PermissionsConfig::from_figment(&Figment::from(Yaml::string(s)));
    }
});
