//! Error types for the device model.

use thiserror::Error;

/// Errors that can occur when loading or querying a device.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeviceError {
    /// Malformed device descriptor.
    #[error("Invalid device descriptor: {0}")]
    BadDescriptor(String),

    /// Descriptor failed to deserialize.
    #[error("Device descriptor is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Qubit index outside the device.
    #[error("Qubit {qubit} out of range for device with {size} qubits")]
    OutOfRange { qubit: usize, size: usize },

    /// Fidelity queried for an uncoupled pair.
    #[error("Qubits {0} and {1} are not coupled")]
    NotCoupled(usize, usize),

    /// No path between two qubits.
    #[error("No path between qubits {0} and {1}")]
    Disconnected(usize, usize),
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
