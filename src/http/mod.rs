//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (net)
//!     → request.rs (x-request-id, set and echoed)
//!     → server.rs (access log span, HTML validation in development)
//!     → application router, falling back to the public folder
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use server::{HttpServer, Listeners};
