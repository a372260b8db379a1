//! Realtime transport layer: event fan-out, wire frames and the WebSocket
//! client.

pub mod hub;
#[cfg(test)]
pub mod memory;
pub mod websocket;
pub mod wire;

/// Returns the transport module name for smoke checks.
pub fn module_name() -> &'static str {
    "transport"
}
