//! Outbound side of a client connection as seen by the game logic
//!
//! Games never touch sockets. They hold a [`Connection`] per participant and
//! push [`ServerMessage`]s through it; the network layer decides how those
//! reach the wire.

use shared::{ClientId, ServerMessage};

pub trait Connection {
    /// Server-assigned id, stable for the life of the connection
    fn id(&self) -> ClientId;

    /// Queues a message for delivery. Delivery failures are the transport's
    /// concern; a dead connection surfaces later as a disconnect event.
    fn send(&self, message: &ServerMessage);

    /// Asks the transport to terminate the connection.
    fn close(&self);
}
