//! Error types for the IR crate.

use thiserror::Error;

use crate::ast::VarAccess;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Reference to a register that is not declared.
    #[error("Unknown register '{0}'")]
    UnknownRegister(String),

    /// Offset outside the register bounds.
    #[error("Access {access} out of range for register of size {size}")]
    OffsetOutOfRange {
        /// The offending access.
        access: VarAccess,
        /// Declared register size.
        size: u32,
    },

    /// Scope stack underflow; indicates a traversal bug.
    #[error("Attempted to pop the global scope")]
    EmptyScopeStack,

    /// An expression that cannot be interpreted as an angle.
    #[error("Expression '{0}' is not a valid angle")]
    NotAnAngle(String),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
