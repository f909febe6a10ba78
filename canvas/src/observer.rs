//! Local mutation observer.
//!
//! Looks at each lifecycle notification exactly once. Unidentified objects get
//! their id here, on first observation. A notification whose instance is
//! marked in the echo gate is the local replay of a remote change: the mark is
//! cleared and nothing is published. Anything else is a local edit and goes
//! to the publisher.

#[cfg(test)]
#[path = "observer_test.rs"]
mod observer_test;

use tracing::debug;

use crate::channel::Channel;
use crate::doc::{InstanceKey, ObjectId};
use crate::gate::EchoGate;
use crate::id;
use crate::publisher::Publisher;
use crate::surface::{Lifecycle, Surface};

/// What the observer did with one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// A local edit was handed to the publisher.
    Published(ObjectId),
    /// A remote change echoed back; nothing was sent.
    Suppressed(ObjectId),
    /// The instance disappeared before it was observed.
    Vanished(InstanceKey),
}

/// Source of fresh object ids.
pub type IdGenerator = fn() -> ObjectId;

pub struct LocalObserver {
    new_id: IdGenerator,
}

impl Default for LocalObserver {
    fn default() -> Self {
        Self { new_id: id::new_id }
    }
}

impl LocalObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom id source instead of random UUIDs.
    #[must_use]
    pub fn with_generator(new_id: IdGenerator) -> Self {
        Self { new_id }
    }

    pub fn observe<C: Channel>(
        &self,
        surface: &mut Surface,
        gate: &mut EchoGate,
        publisher: &Publisher<C>,
        note: Lifecycle,
    ) -> Observation {
        match note {
            Lifecycle::Added(key) | Lifecycle::Modified(key) => {
                let added = matches!(note, Lifecycle::Added(_));
                let Some(id) = self.identify(surface, key) else {
                    gate.is_suppressed_and_clear(key);
                    return Observation::Vanished(key);
                };
                if gate.is_suppressed_and_clear(key) {
                    debug!(%id, %key, added, "observer: echo suppressed");
                    return Observation::Suppressed(id);
                }
                if let Some(obj) = surface.get(key) {
                    if added {
                        publisher.publish_added(obj);
                    } else {
                        publisher.publish_modified(obj);
                    }
                }
                Observation::Published(id)
            }
            Lifecycle::Removed { key, object } => {
                let suppressed = gate.is_suppressed_and_clear(key);
                let Some(id) = object.id else {
                    // Never observed, so no peer knows it.
                    return Observation::Vanished(key);
                };
                if suppressed {
                    debug!(%id, %key, "observer: echo suppressed removal");
                    return Observation::Suppressed(id);
                }
                publisher.publish_removed(&id);
                Observation::Published(id)
            }
        }
    }

    /// The instance's id, assigning a fresh one if it has none yet.
    fn identify(&self, surface: &mut Surface, key: InstanceKey) -> Option<ObjectId> {
        let existing = surface.get(key)?.id.clone();
        if let Some(id) = existing {
            return Some(id);
        }
        let id = (self.new_id)();
        surface.assign_id(key, id.clone());
        debug!(%id, %key, "observer: assigned id");
        Some(id)
    }
}
