//! Extension and observer callbacks applied around instance creation

use super::instance::Instance;
use super::resolver::Resolver;
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Post-construction transform; may wrap or replace the instance
pub type Extender = Arc<dyn Fn(Instance, &mut Resolver<'_>) -> Result<Instance> + Send + Sync>;

/// Observer fired when an instance is resolved
pub type Callback = Arc<dyn Fn(&Instance, &mut Resolver<'_>) -> Result<()> + Send + Sync>;

#[derive(Default, Clone)]
pub(crate) struct Hooks {
    extenders: HashMap<String, Vec<Extender>>,
    resolving: HashMap<String, Vec<Callback>>,
    resolved: HashMap<String, Vec<Callback>>,
    global_resolving: Vec<Callback>,
    global_resolved: Vec<Callback>,
}

impl Hooks {
    pub(crate) fn add_extender(&mut self, key: String, extender: Extender) {
        self.extenders.entry(key).or_default().push(extender);
    }

    pub(crate) fn add_resolving(&mut self, key: Option<String>, callback: Callback) {
        match key {
            Some(key) => self.resolving.entry(key).or_default().push(callback),
            None => self.global_resolving.push(callback),
        }
    }

    pub(crate) fn add_resolved(&mut self, key: Option<String>, callback: Callback) {
        match key {
            Some(key) => self.resolved.entry(key).or_default().push(callback),
            None => self.global_resolved.push(callback),
        }
    }

    pub(crate) fn extenders(&self, key: &str) -> Vec<Extender> {
        self.extenders.get(key).cloned().unwrap_or_default()
    }

    /// Global observers first, then the key's own, each in registration order
    pub(crate) fn resolving(&self, key: &str) -> Vec<Callback> {
        Self::collect(&self.global_resolving, self.resolving.get(key))
    }

    pub(crate) fn resolved(&self, key: &str) -> Vec<Callback> {
        Self::collect(&self.global_resolved, self.resolved.get(key))
    }

    pub(crate) fn forget_extenders(&mut self, key: &str) {
        self.extenders.remove(key);
    }

    fn collect(global: &[Callback], keyed: Option<&Vec<Callback>>) -> Vec<Callback> {
        global
            .iter()
            .chain(keyed.into_iter().flatten())
            .cloned()
            .collect()
    }
}
