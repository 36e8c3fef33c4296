use std::collections::BTreeSet;

use crate::key::WILDCARD;

/// Verbs granted on one [`PermissionKey`](crate::PermissionKey).
///
/// A set that would contain `"*"` always collapses to [`VerbSet::All`],
/// so `"*"` never coexists with concrete verbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerbSet {
    /// Every verb.
    All,
    /// Exactly these verbs. May be empty.
    Only(BTreeSet<String>),
}

impl Default for VerbSet {
    fn default() -> Self {
        VerbSet::Only(BTreeSet::new())
    }
}

impl VerbSet {
    #[must_use]
    pub fn from_verbs<I, S>(verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for verb in verbs {
            let verb = verb.as_ref();
            if verb == WILDCARD {
                return VerbSet::All;
            }
            set.insert(verb.to_owned());
        }
        VerbSet::Only(set)
    }

    /// Union of both sets.
    #[must_use]
    pub fn union(&self, other: &VerbSet) -> VerbSet {
        match (self, other) {
            (VerbSet::All, _) | (_, VerbSet::All) => VerbSet::All,
            (VerbSet::Only(a), VerbSet::Only(b)) => VerbSet::Only(a.union(b).cloned().collect()),
        }
    }

    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, VerbSet::All)
    }

    #[must_use]
    pub fn allows(&self, verb: &str) -> bool {
        match self {
            VerbSet::All => true,
            VerbSet::Only(verbs) => verbs.contains(verb),
        }
    }

    /// `true` when every verb granted by `other` is granted here too.
    #[must_use]
    pub fn is_superset(&self, other: &VerbSet) -> bool {
        match (self, other) {
            (VerbSet::All, _) => true,
            (VerbSet::Only(_), VerbSet::All) => false,
            (VerbSet::Only(a), VerbSet::Only(b)) => a.is_superset(b),
        }
    }

    /// Verbs as strings; [`VerbSet::All`] yields the single entry `"*"`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            VerbSet::All => vec![WILDCARD.to_owned()],
            VerbSet::Only(verbs) => verbs.iter().cloned().collect(),
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for VerbSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        VerbSet::from_verbs(iter)
    }
}

impl serde::Serialize for VerbSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.to_vec())
    }
}

impl<'de> serde::Deserialize<'de> for VerbSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let verbs = Vec::<String>::deserialize(deserializer)?;
        Ok(VerbSet::from_verbs(verbs))
    }
}
