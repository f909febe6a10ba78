//! Object synchronization core for the shared canvas.
//!
//! Each client holds a [`replica::Replica`]: its own copy of the object set
//! plus the machinery that keeps that copy in step with every other client.
//! Local edits are published as one event per mutation; remote events are
//! applied without being sent back out; a joining client replaces its state
//! with a full sync. Transport is abstracted behind [`channel::Channel`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`replica`] | One client's reaction loop wiring everything below together |
//! | [`doc`] | Object types and the in-memory [`doc::DocStore`] |
//! | [`wire`] | Object to wire mapping and back |
//! | [`surface`] | The local canvas: store plus lifecycle notifications |
//! | [`observer`] | Turns local lifecycle notifications into outbound events |
//! | [`gate`] | Echo suppression side table |
//! | [`publisher`] | Fire-and-forget outbound sends |
//! | [`reconciler`] | Applies inbound events |
//! | [`snapshot`] | Builds full syncs |
//! | [`protocol`] | Sync events and their frame mapping |
//! | [`channel`] | Transport seam and an in-memory channel |
//! | [`id`] | Object id generation |

pub mod channel;
pub mod doc;
pub mod gate;
pub mod id;
pub mod observer;
pub mod protocol;
pub mod publisher;
pub mod reconciler;
pub mod replica;
pub mod snapshot;
pub mod surface;
pub mod wire;
