//! Ordered, deduplicated selections of students or teams

/// Entities that carry a stable identity within a selection
pub trait Keyed {
    type Key: ?Sized + PartialEq;

    fn key(&self) -> &Self::Key;
}

/// Insertion-ordered set of entities with unique keys
///
/// The first entity seen for a key wins: later adds with the same key
/// neither reorder nor overwrite it. Sets are human-scale, so lookups are
/// linear scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<T> {
    items: Vec<T>,
}

impl<T> Default for SelectionSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed> SelectionSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an externally supplied list, dropping repeated keys
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut set = Self::new();
        for item in items {
            set.add(item);
        }
        set
    }

    /// Add an entity unless its key is already present. Returns whether it was inserted.
    pub fn add(&mut self, entity: T) -> bool {
        if self.contains(entity.key()) {
            return false;
        }
        self.items.push(entity);
        true
    }

    /// Remove the entity with `key`, if any
    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let index = self.items.iter().position(|item| item.key() == key)?;
        Some(self.items.remove(index))
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &T::Key> {
        self.items.iter().map(|item| item.key())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a, T> IntoIterator for &'a SelectionSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
