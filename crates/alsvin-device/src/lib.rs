//! Physical device model for Alsvin.
//!
//! A [`Device`] is a coupling graph over physical qubits together with
//! single-qubit and two-qubit fidelities. Mapping passes query it for
//! adjacency, fidelity-weighted shortest paths and approximate rooted
//! Steiner trees.
//!
//! Devices are loaded from a JSON descriptor (see [`Device::from_json`]) or
//! built from the factory methods ([`Device::line`], [`Device::grid`], …).

pub mod device;
pub mod error;

pub use device::{Device, DeviceDescriptor};
pub use error::{DeviceError, DeviceResult};
