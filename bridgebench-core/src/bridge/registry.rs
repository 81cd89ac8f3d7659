// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Thread-safe table of objects exported over a connection.
//!
//! Uses DashMap so call handlers running on different tasks (or, in per-call
//! mode, different worker threads) can resolve targets without a global lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::dispatch::Exported;
use crate::error::{BridgeError, BridgeResult};
use crate::types::ObjectId;

/// Registry of exported objects, keyed by the id the peer uses to reach them.
pub struct ObjectRegistry {
    objects: DashMap<ObjectId, Arc<dyn Exported>>,
    next_id: AtomicU64,
}

impl ObjectRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a registry wrapped in an Arc for sharing across tasks.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Reserve a fresh generated id (`o1`, `o2`, ...).
    pub fn allocate_id(&self) -> ObjectId {
        ObjectId::generated(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Export an object under a freshly generated id.
    pub fn register(&self, object: Arc<dyn Exported>) -> ObjectId {
        let id = self.allocate_id();
        self.objects.insert(id.clone(), object);
        id
    }

    /// Export an object under a caller-chosen id.
    pub fn register_as(&self, id: ObjectId, object: Arc<dyn Exported>) -> BridgeResult<()> {
        match self.objects.entry(id) {
            Entry::Occupied(entry) => Err(BridgeError::ObjectAlreadyExported(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(object);
                Ok(())
            }
        }
    }

    /// Stop exporting an object.
    pub fn unregister(&self, id: &ObjectId) -> BridgeResult<Arc<dyn Exported>> {
        self.objects
            .remove(id)
            .map(|(_, object)| object)
            .ok_or_else(|| BridgeError::ObjectNotFound(id.clone()))
    }

    /// Resolve the target of an incoming call.
    pub fn get(&self, id: &ObjectId) -> BridgeResult<Arc<dyn Exported>> {
        self.objects
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BridgeError::ObjectNotFound(id.clone()))
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("objects", &self.objects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::dispatch::EchoObject;
    use crate::exerciser::ValueEcho;

    fn echo_object() -> Arc<dyn Exported> {
        Arc::new(EchoObject::new(Arc::new(ValueEcho)))
    }

    #[test]
    fn test_register_generates_unique_ids() {
        let registry = ObjectRegistry::new();
        let a = registry.register(echo_object());
        let b = registry.register(echo_object());

        assert_ne!(a, b);
        assert_eq!(a.as_str(), "o1");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_as_rejects_duplicates() {
        let registry = ObjectRegistry::new();
        registry
            .register_as(ObjectId::entry_point(), echo_object())
            .unwrap();

        let result = registry.register_as(ObjectId::entry_point(), echo_object());
        assert!(matches!(result, Err(BridgeError::ObjectAlreadyExported(_))));
    }

    #[test]
    fn test_register_as_concurrent_single_winner() {
        let registry = ObjectRegistry::new_shared();
        let id = ObjectId::new("shared").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let id = id.clone();
                std::thread::spawn(move || registry.register_as(id, echo_object()).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = ObjectRegistry::new();
        let id = registry.register(echo_object());

        assert!(registry.contains(&id));
        registry.unregister(&id).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get(&id),
            Err(BridgeError::ObjectNotFound(_))
        ));
    }
}
