// Ordered set of device names, shared by matching, exclusion and selection.

use std::collections::BTreeSet;

/// A set of network device names. Iteration is always in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSet {
    names: BTreeSet<String>,
}

impl DeviceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn add_all<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.add(name);
        }
    }

    /// Removes `name`; removing an absent name is a no-op.
    pub fn remove(&mut self, name: &str) {
        self.names.remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn extend(&mut self, other: DeviceSet) {
        self.names.extend(other.names);
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.names.retain(|n| keep(n));
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_sorted_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for DeviceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = DeviceSet::new();
        set.add_all(iter);
        set
    }
}

impl IntoIterator for DeviceSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}
