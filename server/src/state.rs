//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the relay configuration and a map of live boards. Each board has
//! the authoritative object snapshot new clients are synced from, plus the
//! outbound queue of every connected client. Boards live for the lifetime of
//! the process; nothing is persisted.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::HashMap;
use std::sync::Arc;

use canvas::doc::DocStore;
use frames::Frame;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::RelayConfig;

// =============================================================================
// BOARD STATE
// =============================================================================

/// Per-board live state.
#[derive(Default)]
pub struct BoardState {
    /// Current objects in draw order.
    pub objects: DocStore,
    /// Connected clients: `client_id` -> sender for outgoing frames.
    pub clients: HashMap<Uuid, mpsc::Sender<Frame>>,
}

impl BoardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; all inner fields
/// are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub boards: Arc<RwLock<HashMap<String, BoardState>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self { config: Arc::new(config), boards: Arc::new(RwLock::new(HashMap::new())) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
