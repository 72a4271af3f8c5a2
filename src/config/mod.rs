//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults/config.json (annotated schema)
//!     → defaults.rs (Schema, parsed once)
//!     → loader.rs (merge: defaults < manifest < params < env < CLI)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - The schema document is the single source of truth for recognized keys
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod defaults;
pub mod loader;
pub mod manifest;
pub mod schema;
pub mod validation;

pub use defaults::{default_schema, default_scripts, Schema, SchemaNode, ScriptRole, ScriptSpec, ScriptTable};
pub use loader::{load_config, ConfigError, Overrides};
pub use manifest::Manifest;
pub use schema::{AppConfig, Mode};
