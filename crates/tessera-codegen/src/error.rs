//! Error types for codegen operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for codegen operations.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur while preparing or submitting a kernel build.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("Failed to resolve kernel module {}: {source}", path.display())]
    ModuleResolutionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid call signature {signature:?}: {message}")]
    SignatureParse { signature: String, message: String },

    #[error("Arguments do not match call signature {signature:?}: {message}")]
    SignatureMismatch { signature: String, message: String },

    #[error("Backend '{backend}' failed to build kernel: {message}")]
    BackendFailed { backend: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
