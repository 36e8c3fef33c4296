//! Configuration for permission computation.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, UseCaseError};
use crate::use_cases::{PermissionsUseCase, ProviderFilter, ProviderResources};

/// Prefix of environment variables overriding file values.
pub const ENV_PREFIX: &str = "KUBE_PERMISSIONS_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionsConfig {
    /// Group whose members are treated as administrators.
    pub admin_group: String,

    /// Namespaces reviewed in addition to the organization namespaces.
    pub extra_namespaces: Vec<String>,

    /// JSON array of permissions use cases. `None` disables use cases.
    ///
    /// Also accepts the array already structured, which is what a YAML list
    /// or an environment value such as `[]` turns into.
    #[serde(deserialize_with = "json_text")]
    pub use_cases_json: Option<String>,

    /// Infrastructure provider of this installation (`aws`, `azure`, ...).
    /// `None` checks every use-case resource.
    pub provider: Option<String>,

    /// Resources that only exist on some providers.
    pub provider_resources: ProviderResources,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            admin_group: "api-admin".to_owned(),
            extra_namespaces: vec!["default".to_owned(), "giantswarm".to_owned()],
            use_cases_json: None,
            provider: None,
            provider_resources: [
                (
                    "aws",
                    vec![
                        "awsclusters",
                        "awscontrolplanes",
                        "awsmachinedeployments",
                        "g8scontrolplanes",
                    ],
                ),
                ("azure", vec!["azureclusters", "azuremachines", "azuremachinepools"]),
                ("gcp", vec!["gcpclusters", "gcpmachinetemplates"]),
            ]
            .into_iter()
            .collect(),
        }
    }
}

fn json_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(json)) => Some(json),
        Some(value) => Some(value.to_string()),
    })
}

impl PermissionsConfig {
    /// Load defaults, then `path` (YAML, optional), then `KUBE_PERMISSIONS_*`
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if a source cannot be parsed or holds
    /// unknown keys, and [`ConfigError::UseCases`] if `use_cases_json` is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Self::from_figment(&figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extract the configuration from an already assembled figment.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.use_cases()?;
        tracing::debug!(
            admin_group = %config.admin_group,
            extra_namespaces = ?config.extra_namespaces,
            use_cases = config.use_cases_json.is_some(),
            provider = config.provider.as_deref().unwrap_or("any"),
            "permissions configuration loaded"
        );
        Ok(config)
    }

    /// Filter for [`statuses_for_use_cases`](crate::statuses_for_use_cases),
    /// or `None` when no provider is configured.
    #[must_use]
    pub fn provider_filter(&self) -> Option<ProviderFilter<'_>> {
        self.provider
            .as_deref()
            .map(|provider| self.provider_resources.for_provider(provider))
    }

    /// Parsed use cases, or `None` when none are configured.
    ///
    /// # Errors
    ///
    /// Returns [`UseCaseError::InvalidJson`] if `use_cases_json` is invalid.
    pub fn use_cases(&self) -> Result<Option<Vec<PermissionsUseCase>>, UseCaseError> {
        self.use_cases_json
            .as_deref()
            .filter(|json| !json.trim().is_empty())
            .map(PermissionsUseCase::parse_list)
            .transpose()
    }
}
