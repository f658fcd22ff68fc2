// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Named grammars available as parents.
//!
//! Read-heavy shared map via RwLock. Lookups clone the handle out, so no
//! lock is held while a grammar runs.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use crate::grammar::GrammarHandle;

#[derive(Debug, Default)]
pub struct GrammarRegistry {
    grammars: RwLock<IndexMap<String, GrammarHandle>>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, GrammarHandle>> {
        self.grammars.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, GrammarHandle>> {
        self.grammars.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register under the grammar's own name, returning any grammar it
    /// replaces. Grammars already built on the old one keep using it.
    pub fn register(&self, handle: GrammarHandle) -> Option<GrammarHandle> {
        let name = handle.name().to_string();
        let previous = self.write().insert(name.clone(), handle);
        if previous.is_some() {
            tracing::warn!(grammar = %name, "grammar re-registered; replacing previous definition");
        } else {
            tracing::debug!(grammar = %name, "grammar registered");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<GrammarHandle> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn unregister(&self, name: &str) -> Option<GrammarHandle> {
        let removed = self.write().shift_remove(name);
        if removed.is_some() {
            tracing::debug!(grammar = %name, "grammar unregistered");
        }
        removed
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Lowered-step listing of a registered grammar, when it was kept.
    pub fn listing(&self, name: &str) -> Option<String> {
        self.get(name)?.listing().map(str::to_string)
    }
}
