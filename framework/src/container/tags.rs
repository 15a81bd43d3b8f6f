//! Tag registry: named groups of abstract keys

use std::collections::HashMap;

/// Maps tag names to the keys registered under them, in registration order
///
/// Duplicates are kept; tagging the same key twice resolves it twice.
#[derive(Default, Clone, Debug)]
pub struct TagRegistry {
    tags: HashMap<String, Vec<String>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every key under every tag
    pub fn tag<K, T>(&mut self, keys: K, tags: T)
    where
        K: IntoIterator,
        K::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        for tag in tags {
            self.tags
                .entry(tag.into())
                .or_default()
                .extend(keys.iter().cloned());
        }
    }

    /// Keys under `tag`; empty for unknown tags
    pub fn keys(&self, tag: &str) -> Vec<String> {
        self.tags.get(tag).cloned().unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }
}
