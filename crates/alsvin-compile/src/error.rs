//! Error types for compilation.

use thiserror::Error;

/// Errors that can abort a compilation pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Semantic analysis failed; details are in the diagnostics.
    #[error("{count} semantic error(s)")]
    Semantic { count: usize },

    /// Layout or mapping failure.
    #[error(transparent)]
    Map(#[from] alsvin_map::MapError),

    /// Device model failure.
    #[error(transparent)]
    Device(#[from] alsvin_device::DeviceError),

    /// IR-level failure.
    #[error(transparent)]
    Ir(#[from] alsvin_ir::IrError),

    /// A construct a pass cannot express or process.
    #[error("Unsupported construct: {0}")]
    Unsupported(String),

    /// A violated internal invariant; always a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;
