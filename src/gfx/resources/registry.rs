//! Bookkeeping for GPU-side resources
//!
//! Every geometry, material and texture that enters the live scene registers here and
//! receives a [`ResourceId`]. The renderer keys its GPU caches by that id and evicts an
//! entry once the id is no longer live, so releasing a handle is what frees the GPU
//! memory behind it.

use std::collections::HashMap;

use crate::error::DisposalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Material,
    Texture,
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    next_id: u64,
    live: HashMap<ResourceId, ResourceKind>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: ResourceKind) -> ResourceId {
        self.next_id += 1;
        let id = ResourceId(self.next_id);
        self.live.insert(id, kind);
        id
    }

    /// Releases a live id. Releasing an id twice is an error.
    pub fn release(&mut self, id: ResourceId) -> Result<ResourceKind, DisposalError> {
        self.live
            .remove(&id)
            .ok_or(DisposalError::UnknownHandle(id))
    }

    pub fn is_live(&self, id: ResourceId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn kind_of(&self, id: ResourceId) -> Option<ResourceKind> {
        self.live.get(&id).copied()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_count_of(&self, kind: ResourceKind) -> usize {
        self.live.values().filter(|k| **k == kind).count()
    }
}

/// Optional registry handle carried by a resource.
///
/// Empty until the owner is installed into the live scene. Releasing clears it, so a
/// second release of the same owner is a no-op.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GpuHandle(Option<ResourceId>);

impl GpuHandle {
    pub fn id(&self) -> Option<ResourceId> {
        self.0
    }

    pub fn is_acquired(&self) -> bool {
        self.0.is_some()
    }

    /// Registers the owner if it has no handle yet and returns its id.
    pub fn acquire(&mut self, registry: &mut ResourceRegistry, kind: ResourceKind) -> ResourceId {
        match self.0 {
            Some(id) => id,
            None => {
                let id = registry.register(kind);
                self.0 = Some(id);
                id
            }
        }
    }

    /// Releases the held id, if any. Returns whether an id was released.
    pub fn release(&mut self, registry: &mut ResourceRegistry) -> Result<bool, DisposalError> {
        match self.0.take() {
            Some(id) => registry.release(id).map(|_| true),
            None => Ok(false),
        }
    }
}

/// Cloning a resource yields an unregistered copy.
impl Clone for GpuHandle {
    fn clone(&self) -> Self {
        Self(None)
    }
}
