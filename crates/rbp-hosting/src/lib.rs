//! WebSocket game hosting infrastructure.
//!
//! This module provides the server-side machinery for hosting live poker games
//! over WebSocket connections, managing room lifecycles and client sessions.
//!
//! ## Core Types
//!
//! - [`Casino`] — Central registry of active game rooms, keyed by table id
//! - [`client::serve`] — per-connection bridge task between a WebSocket and a `Room`
//!
//! ## HTTP Handlers
//!
//! The [`handlers`] submodule exposes actix-web routes for room management:
//! create, close, and the `/ws` upgrade.
mod casino;
mod client;
pub mod handlers;

pub use casino::*;
pub use client::*;
