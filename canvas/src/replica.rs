//! One client's copy of the shared canvas.
//!
//! DESIGN
//! ======
//! A `Replica` owns its surface, echo gate, publisher, and observer, and runs
//! every operation as one reaction: mutate, then drain the lifecycle queue
//! through the observer, then purge the gate. Because the reconciler marks an
//! instance before the notification it causes is observed, and the drain runs
//! before the reaction returns, a remote change is never re-published.
//!
//! All methods take `&mut self` and run to completion. Async hosts keep the
//! replica on a single task and feed it inbound frames over a channel.

#[cfg(test)]
#[path = "replica_test.rs"]
mod replica_test;

use frames::Frame;
use tracing::{debug, info, warn};

use crate::channel::Channel;
use crate::doc::{CanvasObject, DocStore, ObjectId};
use crate::gate::EchoGate;
use crate::observer::{LocalObserver, Observation};
use crate::protocol::{ProtocolError, SyncEvent};
use crate::publisher::Publisher;
use crate::reconciler::{self, Applied};
use crate::snapshot;
use crate::surface::Surface;

pub struct Replica<C> {
    surface: Surface,
    gate: EchoGate,
    publisher: Publisher<C>,
    observer: LocalObserver,
    client_id: Option<String>,
}

impl<C: Channel> Replica<C> {
    #[must_use]
    pub fn new(channel: C) -> Self {
        Self::with_observer(channel, LocalObserver::default())
    }

    #[must_use]
    pub fn with_observer(channel: C, observer: LocalObserver) -> Self {
        Self {
            surface: Surface::new(),
            gate: EchoGate::new(),
            publisher: Publisher::new(channel),
            observer,
            client_id: None,
        }
    }

    // =========================================================================
    // LOCAL OPERATIONS
    // =========================================================================

    /// Draw a new object. Returns the id it ends up with, or `None` if an
    /// object with the same id is already on the canvas (edit that one with
    /// [`Self::modify_local`] instead).
    pub fn add_local(&mut self, obj: CanvasObject) -> Option<ObjectId> {
        if let Some(id) = obj.id.as_deref() {
            if self.surface.find(id).is_some() {
                debug!(%id, "replica: local add of live id rejected");
                return None;
            }
        }
        let key = self.surface.add(obj);
        self.surface.render();
        self.settle();
        self.surface.get(key).and_then(|o| o.id.clone())
    }

    /// Edit an object in place. Returns false if `id` is not on the canvas.
    pub fn modify_local(&mut self, id: &str, f: impl FnOnce(&mut CanvasObject)) -> bool {
        let Some(key) = self.surface.find(id) else {
            return false;
        };
        let changed = self.surface.modify(key, f);
        self.surface.render();
        self.settle();
        changed
    }

    /// Erase an object. Returns false if `id` is not on the canvas.
    pub fn remove_local(&mut self, id: &str) -> bool {
        let Some(key) = self.surface.find(id) else {
            return false;
        };
        let removed = self.surface.remove(key);
        self.surface.render();
        self.settle();
        removed
    }

    /// Wipe the canvas and tell peers to do the same.
    pub fn clear_local(&mut self) {
        self.surface.clear();
        self.surface.render();
        self.publisher.publish_clear();
        self.settle();
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Decode and apply one inbound frame.
    ///
    /// # Errors
    ///
    /// Returns the [`ProtocolError`] when the frame is not a valid sync
    /// event. The replica is left unchanged in that case.
    pub fn handle_frame(&mut self, frame: &Frame) -> Result<Applied, ProtocolError> {
        let event = SyncEvent::from_frame(frame).inspect_err(|e| {
            warn!(event = %frame.event, error = %e, "replica: dropping inbound frame");
        })?;
        Ok(self.handle_event(event))
    }

    /// Apply one decoded event as a single reaction.
    pub fn handle_event(&mut self, event: SyncEvent) -> Applied {
        let applied = match event {
            SyncEvent::Connected { client_id } => {
                info!(%client_id, "replica: connected");
                self.client_id = Some(client_id);
                Applied::Passthrough
            }
            SyncEvent::SyncRequest => {
                let sync = self.build_full_sync();
                self.publisher.publish_full_sync(&sync);
                Applied::Passthrough
            }
            other => reconciler::apply(&mut self.surface, &mut self.gate, other),
        };
        self.settle();
        applied
    }

    /// Ask the other side for a full sync.
    pub fn request_full_sync(&self) -> bool {
        self.publisher.publish(&SyncEvent::SyncRequest)
    }

    /// Drain pending notifications through the observer and end the reaction.
    pub fn settle(&mut self) -> Vec<Observation> {
        let mut seen = Vec::new();
        while let Some(note) = self.surface.next_lifecycle() {
            seen.push(self.observer.observe(&mut self.surface, &mut self.gate, &self.publisher, note));
        }
        let leftover = self.gate.purge();
        if leftover > 0 {
            debug!(leftover, "replica: purged unconsumed echo marks");
        }
        seen
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn build_full_sync(&self) -> SyncEvent {
        snapshot::build_full_sync(self.surface.doc())
    }

    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    #[must_use]
    pub fn doc(&self) -> &DocStore {
        self.surface.doc()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CanvasObject> {
        self.surface.doc().get_by_id(id)
    }

    #[must_use]
    pub fn channel(&self) -> &C {
        self.publisher.channel()
    }

    /// Connection id from the last `connect` greeting.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn take_render_request(&mut self) -> bool {
        self.surface.take_render_request()
    }

    pub fn set_background(&mut self, color: impl Into<String>) {
        self.surface.set_background(color);
    }
}
