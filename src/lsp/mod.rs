//! LSP protocol layer
//! - server.rs: stdio serve loop and outbound writer task
//! - transport.rs: Content-Length framing
//! - dispatcher.rs: method routing gated by the lifecycle
//! - lifecycle.rs: lifecycle state machine
//! - context.rs: state shared by every handler
//! - client.rs: server-to-client notifications
//! - capabilities.rs: initialize reply contents
//! - handlers/: request and notification handlers

pub mod capabilities;
pub mod client;
pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod lifecycle;
pub mod server;
pub mod transport;
