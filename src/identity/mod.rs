//! Identity module for the chat hub
//!
//! This module hands out the display names shown next to chat messages
//! and keeps them unique among live connections.

mod pool;

pub use pool::{Identity, IdentityPool, DEFAULT_NAMES};
