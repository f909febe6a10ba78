//! Inbound reconciler.
//!
//! Applies one remote event to the local surface. Events are handled one at a
//! time, in arrival order, with no buffering: a `Modified` for an object this
//! replica has not seen is dropped, not held back for a later `Added`.
//!
//! Every single-object apply marks the target instance in the echo gate
//! before the surface notification is observed, which keeps the observer from
//! sending the change back out.

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod reconciler_test;

use tracing::{debug, warn};

use crate::doc::ObjectId;
use crate::gate::EchoGate;
use crate::protocol::SyncEvent;
use crate::surface::Surface;
use crate::wire::{self, ObjectError};

/// Why an event left the surface untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ignored {
    /// `Added` for an id that is already live.
    DuplicateAdd(ObjectId),
    /// `Modified`/`Removed` for an id that is not live.
    UnknownObjectReference(ObjectId),
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Inserted(ObjectId),
    Updated(ObjectId),
    Removed(ObjectId),
    Cleared,
    Replaced { count: usize, skipped: usize },
    Ignored(Ignored),
    /// The payload could not be turned into an object.
    Dropped(ObjectError),
    /// Not a canvas event (`connect`, `sync:request`).
    Passthrough,
}

/// Apply `event` to `surface`.
pub fn apply(surface: &mut Surface, gate: &mut EchoGate, event: SyncEvent) -> Applied {
    match event {
        SyncEvent::Added(payload) => {
            if let Some(id) = wire::wire_id(&payload) {
                if surface.find(id).is_some() {
                    debug!(%id, "reconcile: duplicate add ignored");
                    return Applied::Ignored(Ignored::DuplicateAdd(id.to_owned()));
                }
            }
            let obj = match wire::deserialize(&payload) {
                Ok(obj) => obj,
                Err(e) => return dropped(e),
            };
            let id = obj.id.clone().unwrap_or_default();
            let key = surface.add(obj);
            gate.mark_suppressed(key);
            surface.render();
            Applied::Inserted(id)
        }
        SyncEvent::Modified(payload) => {
            let Some(key) = resolve(surface, &payload) else {
                return unknown(&payload);
            };
            let incoming = match wire::deserialize(&payload) {
                Ok(obj) => obj,
                Err(e) => return dropped(e),
            };
            let id = incoming.id.clone().unwrap_or_default();
            gate.mark_suppressed(key);
            surface.modify(key, |obj| obj.replace_attributes(incoming));
            surface.render();
            Applied::Updated(id)
        }
        SyncEvent::Removed(payload) => {
            let Some(key) = resolve(surface, &payload) else {
                return unknown(&payload);
            };
            let id = wire::wire_id(&payload).unwrap_or_default().to_owned();
            gate.mark_suppressed(key);
            surface.remove(key);
            surface.render();
            Applied::Removed(id)
        }
        SyncEvent::ClearAll => {
            surface.clear();
            surface.render();
            Applied::Cleared
        }
        SyncEvent::FullSync(payloads) => {
            let mut objects = Vec::with_capacity(payloads.len());
            let mut skipped = 0;
            for payload in &payloads {
                match wire::deserialize(payload) {
                    Ok(obj) => objects.push(obj),
                    Err(e) => {
                        warn!(error = %e, "reconcile: skipping malformed sync entry");
                        skipped += 1;
                    }
                }
            }
            surface.clear();
            let count = objects.len();
            for obj in objects {
                let key = surface.add(obj);
                gate.mark_suppressed(key);
            }
            surface.render();
            Applied::Replaced { count, skipped }
        }
        SyncEvent::Connected { .. } | SyncEvent::SyncRequest => Applied::Passthrough,
    }
}

fn resolve(surface: &Surface, payload: &crate::doc::WireObject) -> Option<crate::doc::InstanceKey> {
    wire::wire_id(payload).and_then(|id| surface.find(id))
}

fn unknown(payload: &crate::doc::WireObject) -> Applied {
    let id = wire::wire_id(payload).unwrap_or_default().to_owned();
    debug!(%id, "reconcile: unknown object reference ignored");
    Applied::Ignored(Ignored::UnknownObjectReference(id))
}

fn dropped(e: ObjectError) -> Applied {
    warn!(error = %e, "reconcile: dropping malformed object");
    Applied::Dropped(e)
}
