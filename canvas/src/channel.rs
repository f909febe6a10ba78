//! Transport seam.
//!
//! A [`Channel`] is one endpoint of the bidirectional message channel. The
//! protocol only ever sends through it; inbound frames are handed to the
//! replica by whoever owns the receiving half. Delivery guarantees (reliable,
//! ordered per sender) belong to the implementation.

use std::sync::{Arc, Mutex, MutexGuard};

use frames::Frame;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Not connected right now. Reconnect and backlog are the channel's concern.
    #[error("channel unavailable")]
    Unavailable,
    /// The other half is gone for good.
    #[error("channel closed")]
    Closed,
}

pub trait Channel {
    /// Hand one frame to the transport. Never waits for acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the frame could not be handed over.
    fn send(&self, frame: Frame) -> Result<(), ChannelError>;

    fn is_connected(&self) -> bool {
        true
    }
}

impl Channel for std::sync::mpsc::Sender<Frame> {
    fn send(&self, frame: Frame) -> Result<(), ChannelError> {
        std::sync::mpsc::Sender::send(self, frame).map_err(|_| ChannelError::Closed)
    }
}

/// In-process channel that records outgoing frames.
///
/// Clones share the same outbox, so a host can keep one clone to drain what
/// the replica sent while the replica owns the other.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug)]
struct MemoryInner {
    outbox: Vec<Frame>,
    connected: bool,
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self { inner: Arc::new(Mutex::new(MemoryInner { outbox: Vec::new(), connected: true })) }
    }
}

impl MemoryChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    /// Remove and return everything sent so far.
    #[must_use]
    pub fn take_sent(&self) -> Vec<Frame> {
        std::mem::take(&mut self.lock().outbox)
    }

    #[must_use]
    pub fn sent_len(&self) -> usize {
        self.lock().outbox.len()
    }
}

impl Channel for MemoryChannel {
    fn send(&self, frame: Frame) -> Result<(), ChannelError> {
        let mut inner = self.lock();
        if !inner.connected {
            return Err(ChannelError::Unavailable);
        }
        inner.outbox.push(frame);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }
}
