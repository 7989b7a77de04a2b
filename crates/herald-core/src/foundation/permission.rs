//! Named permission sets.
//!
//! Herald does not compute effective permissions; it only asks the platform
//! whether an actor holds a [`PermissionSet`] at a given location. Names are
//! opaque strings defined by the platform (e.g. `"BAN_MEMBERS"`).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered set of permission names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    /// Creates an empty permission set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds a permission to the set.
    pub fn with(mut self, permission: impl Into<String>) -> Self {
        self.0.insert(permission.into());
        self
    }

    /// Inserts a permission, returning `true` if it was not present.
    pub fn insert(&mut self, permission: impl Into<String>) -> bool {
        self.0.insert(permission.into())
    }

    /// Returns `true` if the set requires nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of permissions in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set contains `permission`.
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// Iterates over permission names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns `true` if every permission in `self` is also in `granted`.
    pub fn is_subset(&self, granted: &PermissionSet) -> bool {
        self.0.is_subset(&granted.0)
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for PermissionSet {
    fn from(permissions: [S; N]) -> Self {
        permissions.into_iter().collect()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for permission in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            f.write_str(permission)?;
            first = false;
        }
        Ok(())
    }
}
