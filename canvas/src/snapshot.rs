//! Full-sync responder.

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;

use tracing::debug;

use crate::doc::DocStore;
use crate::protocol::SyncEvent;
use crate::wire;

/// Serialize every identified object, in draw order, into one `FullSync`.
/// Objects that have not been observed yet carry no id and are left out.
#[must_use]
pub fn build_full_sync(doc: &DocStore) -> SyncEvent {
    let objects: Vec<_> = doc.objects().filter(|o| o.id.is_some()).map(wire::serialize).collect();
    debug!(count = objects.len(), skipped = doc.len() - objects.len(), "snapshot: built full sync");
    SyncEvent::FullSync(objects)
}
