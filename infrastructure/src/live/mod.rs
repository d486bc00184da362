//! Live-Session WebSocket adapter
//!
//! Implements `LiveGateway` over a WebSocket connection carrying one
//! session.

pub mod client;
pub mod error;
pub mod gateway;
pub mod mailbox;
pub mod protocol;
pub mod transport;
