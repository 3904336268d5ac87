//! duetask gateway server library.
//!
//! Exposes the server for use in tests and embedding. The server accepts
//! WebSocket connections, registers actors, and turns their frames into
//! conversation events.

pub mod config;
pub mod gateway;
pub mod server;
