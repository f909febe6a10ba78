//! The local canvas: a `DocStore` that announces its mutations.
//!
//! `Surface` is what drawing tools and the reconciler mutate. Every
//! single-object mutation queues one [`Lifecycle`] notification; the replica
//! drains the queue through the local observer before its reaction ends.
//! `clear` is a bulk operation and queues nothing.
//!
//! Rendering is the host's concern. `render` only raises a flag the host
//! consumes with `take_render_request`.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use std::collections::VecDeque;

use crate::doc::{CanvasObject, DEFAULT_BACKGROUND, DocStore, InstanceKey, ObjectId};

/// A lifecycle notification for one object instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Lifecycle {
    /// The instance was inserted.
    Added(InstanceKey),
    /// The instance was mutated in place.
    Modified(InstanceKey),
    /// The instance was removed; it travels with the notification.
    Removed { key: InstanceKey, object: CanvasObject },
}

impl Lifecycle {
    #[must_use]
    pub fn key(&self) -> InstanceKey {
        match self {
            Self::Added(key) | Self::Modified(key) | Self::Removed { key, .. } => *key,
        }
    }
}

#[derive(Debug)]
pub struct Surface {
    doc: DocStore,
    pending: VecDeque<Lifecycle>,
    background: String,
    render_requested: bool,
    renders: u64,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            doc: DocStore::new(),
            pending: VecDeque::new(),
            background: DEFAULT_BACKGROUND.to_owned(),
            render_requested: false,
            renders: 0,
        }
    }
}

impl Surface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the object set.
    #[must_use]
    pub fn doc(&self) -> &DocStore {
        &self.doc
    }

    /// Insert an object and queue `Added`.
    pub fn add(&mut self, obj: CanvasObject) -> InstanceKey {
        let key = self.doc.insert(obj);
        self.pending.push_back(Lifecycle::Added(key));
        key
    }

    /// Mutate an object in place and queue `Modified`. Returns false if the
    /// instance is gone, in which case nothing is queued.
    pub fn modify(&mut self, key: InstanceKey, f: impl FnOnce(&mut CanvasObject)) -> bool {
        if !self.doc.modify(key, f) {
            return false;
        }
        self.pending.push_back(Lifecycle::Modified(key));
        true
    }

    /// Remove an object and queue `Removed`. Returns false if the instance
    /// is gone.
    pub fn remove(&mut self, key: InstanceKey) -> bool {
        let Some(object) = self.doc.remove(key) else {
            return false;
        };
        self.pending.push_back(Lifecycle::Removed { key, object });
        true
    }

    /// Drop every object and reset the background. Queues nothing.
    pub fn clear(&mut self) {
        self.doc.clear();
        self.background = DEFAULT_BACKGROUND.to_owned();
    }

    /// Give an unidentified instance its `id`. Not a mutation notification.
    pub fn assign_id(&mut self, key: InstanceKey, id: ObjectId) -> bool {
        self.doc.assign_id(key, id)
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<InstanceKey> {
        self.doc.find(id)
    }

    #[must_use]
    pub fn get(&self, key: InstanceKey) -> Option<&CanvasObject> {
        self.doc.get(key)
    }

    /// Pop the oldest queued notification.
    pub fn next_lifecycle(&mut self) -> Option<Lifecycle> {
        self.pending.pop_front()
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    #[must_use]
    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn set_background(&mut self, color: impl Into<String>) {
        self.background = color.into();
    }

    /// Ask the host to redraw.
    pub fn render(&mut self) {
        self.render_requested = true;
        self.renders += 1;
    }

    /// Consume a pending redraw request.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }

    /// Total number of redraw requests since creation.
    #[must_use]
    pub fn renders(&self) -> u64 {
        self.renders
    }
}
