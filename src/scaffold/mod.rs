//! Project scaffolding subsystem.
//!
//! # Responsibilities
//! - Create the conventional MVC and statics folders
//! - Link statics and compiled assets into the public folder
//! - Remove generated artifacts on request

pub mod clean;
pub mod folders;
pub mod fsutil;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use clean::clean;
pub use folders::{generate, public_dir, Generated};

/// Errors that can occur while scaffolding.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A folder path is occupied by a regular file.
    #[error("{} is a file, but a directory is configured there", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("refusing to touch {}, it is outside the project", .path.display())]
    OutsideProject { path: PathBuf },
}
