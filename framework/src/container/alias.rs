//! Alias table: alternate names for canonical keys

use crate::error::{FrameworkError, Result};
use std::collections::HashMap;

/// Maps alias keys to the key they stand for
///
/// Chains are followed transitively. Cycles are rejected when the alias is
/// registered, so lookups never loop.
#[derive(Default, Clone, Debug)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
    /// Reverse index: abstract key -> aliases registered for it
    abstract_aliases: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` as another name for `target`
    pub fn add(&mut self, alias: &str, target: &str) -> Result<()> {
        if alias == target {
            return Err(FrameworkError::configuration(format!(
                "[{}] is aliased to itself",
                alias
            )));
        }

        // Walking from the target must never lead back to the alias
        let mut chain = vec![alias.to_string(), target.to_string()];
        let mut current = target;
        while let Some(next) = self.aliases.get(current) {
            chain.push(next.clone());
            if next == alias {
                return Err(FrameworkError::configuration(format!(
                    "Alias cycle detected: {}",
                    chain.join(" -> ")
                )));
            }
            current = next;
        }

        self.remove(alias);
        self.aliases.insert(alias.to_string(), target.to_string());
        self.abstract_aliases
            .entry(target.to_string())
            .or_default()
            .push(alias.to_string());
        Ok(())
    }

    /// Follow the alias chain to its final key
    pub fn resolve(&self, key: &str) -> String {
        let mut current = key;
        while let Some(next) = self.aliases.get(current) {
            current = next;
        }
        current.to_string()
    }

    pub fn is_alias(&self, key: &str) -> bool {
        self.aliases.contains_key(key)
    }

    /// Aliases registered directly for `key`
    pub fn aliases_of(&self, key: &str) -> &[String] {
        self.abstract_aliases
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop `key` as an alias, if it is one
    pub fn remove(&mut self, key: &str) {
        if let Some(target) = self.aliases.remove(key) {
            if let Some(list) = self.abstract_aliases.get_mut(&target) {
                list.retain(|a| a != key);
                if list.is_empty() {
                    self.abstract_aliases.remove(&target);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.aliases.clear();
        self.abstract_aliases.clear();
    }
}
