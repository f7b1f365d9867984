//! Error types for layout and mapping.

use alsvin_device::DeviceError;
use thiserror::Error;

/// Errors that can occur during layout assignment or hardware mapping.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MapError {
    /// The program needs more qubits than the device provides.
    #[error("Program requires {required} qubits but device has {available}")]
    TooLarge { required: usize, available: usize },

    /// A CNOT between disconnected physical qubits.
    #[error("No route between physical qubits {q1} and {q2}")]
    Unroutable { q1: usize, q2: usize },

    /// A gate argument outside the device's qubit range.
    #[error("Physical qubit {qubit} out of range for device with {size} qubits")]
    OutOfRange { qubit: usize, size: usize },

    /// A quantum access that is not a physical register dereference.
    #[error("Access '{0}' has not been laid out onto the physical register")]
    UnplacedAccess(String),

    /// Underlying device failure.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Result type for mapping operations.
pub type MapResult<T> = Result<T, MapError>;
