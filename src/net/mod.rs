//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! port / https.port
//!     → listener.rs (bind, contention → actionable error)
//!     → tls.rs (HTTPS only: PEM checks, rustls config)
//!     → http::server (axum-server accept loop)
//! ```

pub mod listener;
pub mod tls;

pub use listener::{bind, bind_ip, ListenerError};
pub use tls::{load_tls_config, TlsError};
