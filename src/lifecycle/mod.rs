//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     manifest → audit → merge + validate config → scaffold → assets
//!     → bind listeners → validator / live reload → serve
//!
//! Shutdown (shutdown.rs):
//!     trigger → stop accepting → drain (shutdownTimeout) → stop validator
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then filesystem work, listeners last
//! - Shutdown has a timeout: open requests are cut off after the deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{spawn_signal_listener, wait_for_signal};
pub use startup::{App, AppBuilder, StartupError};
