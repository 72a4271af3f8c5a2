//! HTML validator subsystem.
//!
//! # Data Flow
//! ```text
//! Development response (text/html)
//!     → middleware.rs (buffer, skip on exception header)
//!     → client.rs (POST to validator web service)
//!     → log errors / warnings, pass response through
//!
//! Validator process:
//!     attached  → process.rs (child of the app, killed on shutdown)
//!     detached  → process.rs re-launches a host program, waits for its lock
//!               → host.rs (holds lock.rs flock, runs validator child)
//!               → autokiller.rs (stops everything once the app is gone)
//! ```

pub mod autokiller;
pub mod client;
pub mod host;
pub mod lock;
pub mod middleware;
pub mod process;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use client::{ValidationMessage, ValidatorClient};
pub use host::{run_host, run_host_if_requested, HostExit, HostRequest};
pub use lock::ProcessLock;
pub use middleware::{validate_html, ValidatorLayerState};
pub use process::{kill_detached, ValidatorHandle};

/// Errors raised by the validator subsystem.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("htmlValidator.command is empty")]
    EmptyCommand,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("validator lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("validator host {program} did not start: {reason}")]
    HostNotReady { program: String, reason: String },

    #[error("validator lock {} is held but names no process", .path.display())]
    UnknownHolder { path: PathBuf },

    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: io::Error,
    },

    #[error("invalid exception header name {0:?}")]
    InvalidHeader(String),

    #[error("validator request failed: {0}")]
    Client(#[source] reqwest::Error),
}
