//! Target group index.
//!
//! Target groups partition resource addresses into failure domains: members
//! of one group are redundant, so at most one of them may be relaunched per
//! apply. Resources outside every group are treated as singleton groups.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use tracing::warn;

/// Immutable mapping of group names to member addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetGroupIndex {
    groups: IndexMap<String, IndexSet<String>>,
    membership: HashMap<String, String>,
}

impl TargetGroupIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from `(group, members)` pairs in declaration order.
    ///
    /// An address declared in several groups stays in the first one.
    #[must_use]
    pub fn from_groups<G, M, A>(groups: G) -> Self
    where
        G: IntoIterator<Item = (String, M)>,
        M: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let mut index = Self::new();
        for (name, members) in groups {
            for member in members {
                index.insert(&name, member);
            }
        }
        index
    }

    /// Adds `address` to `group`.
    ///
    /// Returns false if the address already belongs to another group.
    pub fn insert(&mut self, group: &str, address: impl Into<String>) -> bool {
        let address = address.into();
        if let Some(existing) = self.membership.get(&address) {
            if existing != group {
                warn!(
                    "Resource {address} is already in target group {existing}, ignoring membership in {group}"
                );
                return false;
            }
            return true;
        }

        self.membership.insert(address.clone(), group.to_string());
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(address);
        true
    }

    /// Group the address belongs to, if any.
    #[must_use]
    pub fn group_of(&self, address: &str) -> Option<&str> {
        self.membership.get(address).map(String::as_str)
    }

    /// Members of a group in declaration order.
    #[must_use]
    pub fn members(&self, group: &str) -> Option<&IndexSet<String>> {
        self.groups.get(group)
    }

    /// Group names in declaration order.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if no groups are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
