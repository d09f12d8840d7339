//! Attribute (energy type) selections

use hashbrown::HashSet;

/// An ordered set of attribute names to retain when filtering.
///
/// Names that a dataset does not have are simply never matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeSelection {
    /// Names in the order they were first given.
    names: Vec<String>,
    /// Membership index over `names`.
    index: HashSet<String>,
}

impl AttributeSelection {
    /// Returns true if `name` is selected.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    /// Iterate over selected names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AttributeSelection {
    /// Build a selection, dropping repeated names.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selection = Self::default();
        for name in iter {
            let name = name.into();
            if selection.index.insert(name.clone()) {
                selection.names.push(name);
            }
        }
        selection
    }
}
