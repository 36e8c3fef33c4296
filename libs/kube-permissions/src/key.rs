use std::fmt;
use std::fmt::Write as _;

/// Reserved value matching any group, resource, resource name or verb.
pub const WILDCARD: &str = "*";

const SEPARATOR: char = ':';
const ESCAPE: char = '\\';

/// Lookup key of a compiled permission table.
///
/// Displays and serializes as `"{api_group}:{resource}:{resource_name}"`.
/// Examples:
///  - `":pods:*"` (core group, every pod)
///  - `"apps.gs.io:apps:some-app"`
///  - `"*:*:*"`
///
/// A `':'` or `'\\'` inside a component is escaped with `'\\'`, so distinct
/// keys never share a text form. Parsing also accepts unescaped colons in
/// the resource name (`"rbac.authorization.k8s.io:clusterroles:system:basic-user"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PermissionKey {
    api_group: String,
    resource: String,
    resource_name: String,
}

impl PermissionKey {
    #[must_use]
    pub fn new(api_group: &str, resource: &str, resource_name: &str) -> Self {
        Self {
            api_group: api_group.to_owned(),
            resource: resource.to_owned(),
            resource_name: resource_name.to_owned(),
        }
    }

    /// `*:*:*`, the key granting access to everything in a namespace.
    #[must_use]
    pub fn all() -> Self {
        Self::new(WILDCARD, WILDCARD, WILDCARD)
    }

    /// Every resource of `api_group`.
    #[must_use]
    pub fn group(api_group: &str) -> Self {
        Self::new(api_group, WILDCARD, WILDCARD)
    }

    /// Every object of `resource` in `api_group`.
    #[must_use]
    pub fn resource(api_group: &str, resource: &str) -> Self {
        Self::new(api_group, resource, WILDCARD)
    }

    #[must_use]
    pub fn api_group(&self) -> &str {
        &self.api_group
    }

    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource
    }

    #[must_use]
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        self.api_group == WILDCARD && self.resource == WILDCARD && self.resource_name == WILDCARD
    }

    /// Wildcard keys whose verbs also apply to this key.
    ///
    /// The core group (`""`) is never widened to `*:*:*`; a key whose
    /// resource name is already `"*"` lists itself.
    #[must_use]
    pub fn broader_keys(&self) -> Vec<PermissionKey> {
        let mut keys = Vec::with_capacity(3);
        if !self.api_group.is_empty() {
            keys.push(Self::all());
        }
        if !self.resource.is_empty() {
            keys.push(Self::group(&self.api_group));
        }
        if !self.resource_name.is_empty() {
            keys.push(Self::resource(&self.api_group, &self.resource));
        }
        keys
    }
}

fn write_component(f: &mut fmt::Formatter<'_>, component: &str) -> fmt::Result {
    for c in component.chars() {
        if c == SEPARATOR || c == ESCAPE {
            f.write_char(ESCAPE)?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_component(f, &self.api_group)?;
        f.write_char(SEPARATOR)?;
        write_component(f, &self.resource)?;
        f.write_char(SEPARATOR)?;
        write_component(f, &self.resource_name)
    }
}

impl PermissionKey {
    /// Inverse of the `Display` form. `None` if a component is missing or
    /// the text ends in a dangling escape.
    fn parse(s: &str) -> Option<Self> {
        let mut parts = vec![String::new()];
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                ESCAPE => {
                    let escaped = chars.next()?;
                    parts.last_mut()?.push(escaped);
                }
                SEPARATOR if parts.len() < 3 => parts.push(String::new()),
                c => parts.last_mut()?.push(c),
            }
        }

        let [api_group, resource, resource_name] = <[String; 3]>::try_from(parts).ok()?;
        Some(Self {
            api_group,
            resource,
            resource_name,
        })
    }
}

impl serde::Serialize for PermissionKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for PermissionKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PermissionKey::parse(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "Expected format 'api_group:resource:resource_name', got: {s}"
            ))
        })
    }
}
