//! Per-connection object registry.
//!
//! Every client-allocated id maps to exactly one [`ProtocolObject`] entry.
//! Ids are never reused within a connection, so a duplicated insert is a
//! client bug; we keep the original entry and log the attempt rather than
//! corrupt routing for the first object.

use crate::core::globals::{object_for_global, GlobalId};
use crate::core::objects::{ObjectId, ProtocolObject};
use crate::prelude::*;
use crate::util::logging::REGISTRY;
use crate::wlog;

#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: HashMap<ObjectId, ProtocolObject>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `object` under `id`. Refuses to overwrite a live entry.
    pub fn add(&mut self, id: ObjectId, object: ProtocolObject) -> bool {
        if let Some(existing) = self.objects.get(&id) {
            wlog!(
                REGISTRY,
                "refusing to rebind id {} ({} -> {})",
                id,
                existing.name(),
                object.name()
            );
            return false;
        }
        self.objects.insert(id, object);
        true
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<ProtocolObject> {
        self.objects.remove(&id)
    }

    /// Resolve an id. Global ids resolve even when the connection never
    /// created a local entry for them, so requests addressed straight at an
    /// advertised global still route.
    pub fn get(&self, id: ObjectId) -> Option<ProtocolObject> {
        self.objects
            .get(&id)
            .copied()
            .or_else(|| object_for_global(GlobalId(id.raw())))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::globals::GLOBAL_COMPOSITOR;

    #[test]
    fn add_get_remove() {
        let mut reg = ObjectRegistry::new();
        let id = ObjectId::new(3);
        assert!(reg.add(id, ProtocolObject::Surface));
        assert_eq!(reg.get(id), Some(ProtocolObject::Surface));
        assert_eq!(reg.remove(id), Some(ProtocolObject::Surface));
        assert_eq!(reg.get(id), None);
    }

    #[test]
    fn duplicate_id_is_refused() {
        let mut reg = ObjectRegistry::new();
        let id = ObjectId::new(3);
        assert!(reg.add(id, ProtocolObject::Surface));
        assert!(!reg.add(id, ProtocolObject::Region));
        assert_eq!(reg.get(id), Some(ProtocolObject::Surface));
    }

    #[test]
    fn global_ids_resolve_without_local_entry() {
        let reg = ObjectRegistry::new();
        let id = ObjectId::new(GLOBAL_COMPOSITOR.0);
        assert_eq!(reg.get(id), Some(ProtocolObject::Compositor));
    }
}
