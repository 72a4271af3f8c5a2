//! Live reload subsystem.
//!
//! # Data Flow
//! ```text
//! public / build output change
//!     → watcher.rs (notify → broadcast of changed paths)
//!     → server.rs (debounce, push "reload" over each websocket)
//!     → browser (reload.js calls location.reload())
//! ```

pub mod server;
pub mod watcher;

pub use server::{client_script, router, serve};
pub use watcher::ReloadWatcher;
