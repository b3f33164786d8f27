//! In-memory registry adapter.
//!
//! Keeps the set of registered entity names, the way a device model would
//! expose them, and rejects a second registration of the same name.  Used
//! by hosts without a real inspection surface and by tests.

use log::debug;

use crate::app::ports::{EntityRef, Registry};
use crate::error::RegistryError;

#[derive(Debug, Default)]
pub struct MemoryRegistry {
    /// Registration order.
    entries: Vec<EntityRef>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entity: EntityRef) -> bool {
        self.entries.contains(&entity)
    }

    pub fn entries(&self) -> &[EntityRef] {
        &self.entries
    }

    /// Registered names, e.g. `1-3` and `1-3.2`.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }
}

impl Registry for MemoryRegistry {
    fn register(&mut self, entity: EntityRef) -> Result<(), RegistryError> {
        if self.contains(entity) {
            return Err(RegistryError::NameCollision);
        }
        debug!("registry: + {}", entity);
        self.entries.push(entity);
        Ok(())
    }

    fn unregister(&mut self, entity: EntityRef) {
        if let Some(pos) = self.entries.iter().position(|e| *e == entity) {
            debug!("registry: - {}", entity);
            self.entries.remove(pos);
        }
    }
}
