//! Line-based multi-client chat server.
//!
//! Clients connect over TCP, answer a name prompt, and from then on every
//! line they send is relayed, timestamped, to everyone else in the room.
//!
//! - [`server`] owns the listener and spawns one task per connection.
//! - [`handler`] runs a connection through the name handshake, the relay
//!   loop and the disconnect cleanup.
//! - [`registry`] maps chatter names to their connections and broadcasts.
//! - [`connection`] and [`chat_log`] define the sink and log capabilities
//!   the registry writes through, with the TCP and file implementations.
//! - [`message`] builds the text the server sends and reads client lines.
//! - [`config`] and [`cli`] resolve where to listen and where to log.

pub mod chat_log;
pub mod cli;
pub mod config;
pub mod connection;
pub mod handler;
pub mod message;
pub mod registry;
pub mod server;

#[cfg(test)]
mod testing;
