//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → request spans carrying the x-request-id
//!
//! logging.rs:
//!     boot filter → logging.methods filter (reloaded) → fmt layer (stdout)
//! ```

pub mod logging;

pub use logging::{init_logging, LogHandle};
