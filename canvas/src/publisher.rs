//! Outbound publisher.
//!
//! Serializes local mutations and sends one frame per mutation. Delivery is
//! fire-and-forget: a failed send is logged and otherwise ignored, and the
//! replica stays usable. A disconnected channel means the event is lost for
//! peers until the next full sync.

use serde_json::json;
use tracing::{debug, warn};

use crate::channel::{Channel, ChannelError};
use crate::doc::CanvasObject;
use crate::protocol::SyncEvent;
use crate::wire;

pub struct Publisher<C> {
    channel: C,
}

impl<C: Channel> Publisher<C> {
    #[must_use]
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    #[must_use]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn publish_added(&self, obj: &CanvasObject) -> bool {
        self.publish(&SyncEvent::Added(wire::serialize(obj)))
    }

    pub fn publish_modified(&self, obj: &CanvasObject) -> bool {
        self.publish(&SyncEvent::Modified(wire::serialize(obj)))
    }

    pub fn publish_removed(&self, id: &str) -> bool {
        let mut payload = crate::doc::WireObject::new();
        payload.insert(wire::KEY_ID.into(), json!(id));
        self.publish(&SyncEvent::Removed(payload))
    }

    pub fn publish_clear(&self) -> bool {
        self.publish(&SyncEvent::ClearAll)
    }

    /// Send a snapshot built by [`crate::snapshot::build_full_sync`].
    pub fn publish_full_sync(&self, sync: &SyncEvent) -> bool {
        self.publish(sync)
    }

    /// Send one event. Returns whether the channel accepted it.
    pub fn publish(&self, event: &SyncEvent) -> bool {
        if !self.channel.is_connected() {
            debug!(event = event.name(), "publish: channel unavailable, dropping");
            return false;
        }
        match self.channel.send(event.to_frame()) {
            Ok(()) => {
                debug!(event = event.name(), id = event.object_id().unwrap_or("-"), "publish: sent");
                true
            }
            Err(ChannelError::Unavailable) => {
                debug!(event = event.name(), "publish: channel unavailable, dropping");
                false
            }
            Err(e) => {
                warn!(event = event.name(), error = %e, "publish: send failed");
                false
            }
        }
    }
}
