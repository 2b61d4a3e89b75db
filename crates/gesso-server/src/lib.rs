//! Development server with live reload for gesso sites.
//!
//! Watches the source tree, rebuilds through [`gesso_static::StaticBuilder`],
//! and pushes reload messages to connected browsers over a WebSocket.

pub mod reload;
pub mod server;
pub mod watcher;

pub use server::{DevServer, DevServerConfig, ServerError};
