//! Domain services used by the websocket route.
//!
//! ARCHITECTURE
//! ============
//! Service modules own board state transitions so route handlers can stay
//! focused on socket plumbing and frame encoding.

pub mod board;
