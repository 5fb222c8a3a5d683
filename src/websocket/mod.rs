//! WebSocket transport for the chat hub
//!
//! This module accepts WebSocket connections, turns frames into hub
//! events and writes hub notifications back as JSON text frames.

mod connection;
mod server;

pub use connection::{ClientMessage, Connection};
pub use server::WebSocketServer;
