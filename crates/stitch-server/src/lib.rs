//! Development server for stitch sites.
//!
//! Serves the build directory, watches the site inputs, rebuilds the whole
//! site on every change and tells connected browsers to reload over a
//! WebSocket.

pub mod reload;
pub mod server;
pub mod watcher;

pub use reload::{ReloadHub, ReloadMessage};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent, WatchRoots};
