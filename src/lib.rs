//! Roosevelt: an MVC web framework runtime.
//!
//! # Architecture Overview
//!
//! ```text
//!   package.json ──▶ audit ──▶ config ──▶ scaffold ──▶ assets
//!   (rooseveltConfig,  (schema    (layered    (folders,     (compile,
//!    scripts, deps)     diff)      merge)      symlinks)     bundle)
//!                                    │
//!                                    ▼
//!                    ┌──────────── lifecycle ────────────┐
//!                    │  net ──▶ http (app router,        │
//!                    │          public folder, request   │
//!                    │          ids, access logs)        │
//!                    │  validator (HTML checks, host,    │
//!                    │             auto-killer)          │
//!                    │  reload (watch + websocket)       │
//!                    └───────────────────────────────────┘
//! ```

// Project setup
pub mod audit;
pub mod config;
pub mod scaffold;

// Asset pipeline
pub mod assets;

// Serving
pub mod http;
pub mod lifecycle;
pub mod net;

// Development tooling
pub mod reload;
pub mod validator;

// Cross-cutting concerns
pub mod cli;
pub mod observability;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{App, AppBuilder, Shutdown, StartupError};
