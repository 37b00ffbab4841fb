//! Attribute tables shared by modules, classes, instances and substitutes.

use super::attr::Attr;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A shared, mutable name → attribute table.
///
/// Cloning a `Namespace` clones the handle, not the table. Values are cloned
/// out on read so no lock is held while the caller uses them.
#[derive(Clone, Default)]
pub struct Namespace(Arc<RwLock<HashMap<String, Attr>>>);

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Attr> {
        self.0.read().get(name).cloned()
    }

    /// Insert an attribute, returning the entry it replaced.
    pub fn set(&self, name: impl Into<String>, attr: Attr) -> Option<Attr> {
        self.0.write().insert(name.into(), attr)
    }

    pub fn remove(&self, name: &str) -> Option<Attr> {
        self.0.write().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.read().contains_key(name)
    }

    /// Attribute names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Namespace").field(&self.names()).finish()
    }
}
